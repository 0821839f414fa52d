//! Service location for resolver instances
//!
//! The schema builder never constructs domain objects itself: the singleton a
//! resolver method is invoked on comes from a [`ServiceLocator`] supplied by
//! the embedding application. [`InMemoryLocator`] is the trivial registry used
//! in tests and small embeddings; a host application backed by a real container
//! implements the trait over its own lookup.

use crate::model::HostTypeId;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// A type-erased singleton service instance.
pub type Service = Arc<dyn Any + Send + Sync>;

/// Resolves the instance a resolver method should be invoked on.
pub trait ServiceLocator: Send + Sync {
    /// Resolve the singleton registered for a host type.
    fn resolve_by_type(&self, host_type: &HostTypeId) -> Option<Service>;

    /// Resolve a singleton by registration name.
    fn resolve_by_name(&self, name: &str) -> Option<Service>;

    /// Whether any instance is registered for the host type.
    fn exists(&self, host_type: &HostTypeId) -> bool;
}

/// Single-instance in-memory registry.
#[derive(Default)]
pub struct InMemoryLocator {
    by_type: HashMap<HostTypeId, Service>,
    by_name: HashMap<String, Service>,
}

impl InMemoryLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a singleton for a host type.
    pub fn register<T: Any + Send + Sync>(mut self, host_type: impl Into<HostTypeId>, service: T) -> Self {
        self.by_type.insert(host_type.into(), Arc::new(service));
        self
    }

    /// Register a singleton under a name.
    pub fn register_named<T: Any + Send + Sync>(mut self, name: impl Into<String>, service: T) -> Self {
        self.by_name.insert(name.into(), Arc::new(service));
        self
    }
}

impl ServiceLocator for InMemoryLocator {
    fn resolve_by_type(&self, host_type: &HostTypeId) -> Option<Service> {
        self.by_type.get(host_type).cloned()
    }

    fn resolve_by_name(&self, name: &str) -> Option<Service> {
        self.by_name.get(name).cloned()
    }

    fn exists(&self, host_type: &HostTypeId) -> bool {
        self.by_type.contains_key(host_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TodoService {
        greeting: &'static str,
    }

    #[test]
    fn test_resolve_by_type_and_downcast() {
        let locator = InMemoryLocator::new().register("todo_service", TodoService { greeting: "hi" });
        let id = HostTypeId::from("todo_service");

        assert!(locator.exists(&id));
        let service = locator.resolve_by_type(&id).expect("should resolve");
        let concrete = service
            .downcast_ref::<TodoService>()
            .expect("should downcast");
        assert_eq!(concrete.greeting, "hi");
    }

    #[test]
    fn test_missing_type_resolves_to_none() {
        let locator = InMemoryLocator::new();
        let id = HostTypeId::from("absent");
        assert!(!locator.exists(&id));
        assert!(locator.resolve_by_type(&id).is_none());
    }

    #[test]
    fn test_resolve_by_name() {
        let locator =
            InMemoryLocator::new().register_named("todos", TodoService { greeting: "named" });
        let service = locator.resolve_by_name("todos").expect("should resolve");
        assert!(service.downcast_ref::<TodoService>().is_some());
    }
}
