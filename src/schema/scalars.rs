//! Scalar type resolution
//!
//! Mapping a host type to a scalar is an extensible chain: the fixed
//! primitive table is consulted first, then the configuration-driven
//! date-type special case, then any resolvers registered by the embedding
//! application, in registration order. A host type claimed by no link in the
//! chain falls through to object-type construction.

use crate::config::SchemaConfig;
use crate::model::HostTypeId;
use std::sync::Arc;

/// How a scalar's runtime value is shaped before it enters the result tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coercion {
    /// Pass the resolver's value through unchanged.
    Identity,
    /// Date-like value exposed as integer epoch milliseconds.
    EpochMillis,
    /// Date-like value exposed as a string in the given chrono format.
    FormatDate(String),
}

/// A host type admitted as a scalar.
#[derive(Debug, Clone)]
pub struct ScalarMapping {
    pub name: String,
    pub coercion: Coercion,
}

impl ScalarMapping {
    pub fn passthrough(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            coercion: Coercion::Identity,
        }
    }
}

/// A pluggable link in the scalar resolution chain.
pub trait ScalarResolver: Send + Sync {
    fn resolve(&self, host_type: &HostTypeId) -> Option<ScalarMapping>;
}

/// The full chain: primitives, dates, then registered resolvers.
pub struct ScalarTable {
    date_mapping: ScalarMapping,
    registry: Vec<Arc<dyn ScalarResolver>>,
}

impl ScalarTable {
    pub fn new(config: &SchemaConfig) -> Self {
        let date_mapping = if config.date_as_timestamp {
            ScalarMapping {
                name: "Timestamp".to_string(),
                coercion: Coercion::EpochMillis,
            }
        } else {
            ScalarMapping {
                name: "DateTime".to_string(),
                coercion: Coercion::FormatDate(config.date_format.clone()),
            }
        };
        Self {
            date_mapping,
            registry: Vec::new(),
        }
    }

    /// Append a resolver to the chain. First match wins.
    pub fn register(&mut self, resolver: Arc<dyn ScalarResolver>) {
        self.registry.push(resolver);
    }

    pub fn resolve(&self, host_type: &HostTypeId) -> Option<ScalarMapping> {
        if let Some(name) = primitive_name(host_type.as_str()) {
            return Some(ScalarMapping::passthrough(name));
        }
        if is_date_like(host_type.as_str()) {
            return Some(self.date_mapping.clone());
        }
        self.registry
            .iter()
            .find_map(|resolver| resolver.resolve(host_type))
    }
}

fn primitive_name(id: &str) -> Option<&'static str> {
    match id {
        "String" | "str" | "char" => Some("String"),
        "i8" | "i16" | "i32" | "u8" | "u16" | "u32" => Some("Int"),
        "i64" | "u64" | "isize" | "usize" => Some("Long"),
        "f32" | "f64" => Some("Float"),
        "bool" => Some("Boolean"),
        _ => None,
    }
}

fn is_date_like(id: &str) -> bool {
    matches!(id, "Date" | "DateTime" | "NaiveDateTime" | "Timestamp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_table() {
        let table = ScalarTable::new(&SchemaConfig::default());
        let mapping = table.resolve(&HostTypeId::from("i32")).expect("should map");
        assert_eq!(mapping.name, "Int");
        assert_eq!(mapping.coercion, Coercion::Identity);
        assert_eq!(
            table.resolve(&HostTypeId::from("i64")).expect("should map").name,
            "Long"
        );
        assert!(table.resolve(&HostTypeId::from("todo")).is_none());
    }

    #[test]
    fn test_date_toggle() {
        let timestamps = ScalarTable::new(&SchemaConfig::default());
        let mapping = timestamps
            .resolve(&HostTypeId::from("DateTime"))
            .expect("should map");
        assert_eq!(mapping.name, "Timestamp");
        assert_eq!(mapping.coercion, Coercion::EpochMillis);

        let config = SchemaConfig {
            date_as_timestamp: false,
            ..Default::default()
        };
        let formatted = ScalarTable::new(&config);
        let mapping = formatted
            .resolve(&HostTypeId::from("DateTime"))
            .expect("should map");
        assert_eq!(mapping.name, "DateTime");
        assert!(matches!(mapping.coercion, Coercion::FormatDate(_)));
    }

    #[test]
    fn test_registered_resolver_is_last_in_chain() {
        struct MoneyScalar;
        impl ScalarResolver for MoneyScalar {
            fn resolve(&self, host_type: &HostTypeId) -> Option<ScalarMapping> {
                (host_type.as_str() == "money").then(|| ScalarMapping::passthrough("Money"))
            }
        }

        let mut table = ScalarTable::new(&SchemaConfig::default());
        table.register(Arc::new(MoneyScalar));
        assert_eq!(
            table.resolve(&HostTypeId::from("money")).expect("should map").name,
            "Money"
        );
        // the fixed table still wins for primitives
        assert_eq!(
            table.resolve(&HostTypeId::from("bool")).expect("should map").name,
            "Boolean"
        );
    }
}
