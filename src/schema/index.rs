//! The finished, read-only schema index
//!
//! Built once by the schema builder, then shared across any number of
//! concurrent query executions. Nothing in here is mutated after the build,
//! so no locking is involved: executions hold an `Arc<SchemaIndex>`.

use crate::config::SchemaConfig;
use crate::expr::ExpressionEvaluator;
use crate::model::HostTypeId;
use crate::schema::scalars::Coercion;
use crate::schema::types::{FieldDescriptor, MutationDescriptor, TypeDescriptor};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// The complete built type graph plus the lookup tables the engine and the
/// mutation query template need at runtime.
pub struct SchemaIndex {
    pub(crate) types: IndexMap<String, Arc<TypeDescriptor>>,
    pub(crate) query_type: String,
    pub(crate) mutation_type: Option<String>,
    pub(crate) object_type_by_host: HashMap<HostTypeId, String>,
    pub(crate) mutations: IndexMap<String, MutationDescriptor>,
    /// (mutation name, input host type) → input wrapper field name.
    pub(crate) mutation_input_field_by_host: HashMap<(String, HostTypeId), String>,
    /// (mutation name, return host type) → output wrapper type name.
    pub(crate) mutation_output_type_by_host: HashMap<(String, HostTypeId), String>,
    /// Scalar type name → runtime value coercion.
    pub(crate) scalar_coercions: HashMap<String, Coercion>,
    pub(crate) config: SchemaConfig,
    pub(crate) evaluator: Arc<dyn ExpressionEvaluator>,
}

impl std::fmt::Debug for SchemaIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaIndex")
            .field("query_type", &self.query_type)
            .field("mutation_type", &self.mutation_type)
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("mutations", &self.mutations.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl SchemaIndex {
    pub fn type_named(&self, name: &str) -> Option<&Arc<TypeDescriptor>> {
        self.types.get(name)
    }

    pub fn types(&self) -> impl Iterator<Item = &Arc<TypeDescriptor>> {
        self.types.values()
    }

    /// The root query object type.
    pub fn query_type(&self) -> &Arc<TypeDescriptor> {
        // the builder refuses to finish without a query root
        &self.types[&self.query_type]
    }

    /// The root mutation object type, when any mutation is registered.
    pub fn mutation_type(&self) -> Option<&Arc<TypeDescriptor>> {
        self.mutation_type.as_ref().and_then(|name| self.types.get(name))
    }

    /// The object type built for a host type, when one was admitted.
    pub fn object_type_for_host(&self, host_type: &HostTypeId) -> Option<&Arc<TypeDescriptor>> {
        self.object_type_by_host
            .get(host_type)
            .and_then(|name| self.types.get(name))
    }

    pub fn mutation(&self, name: &str) -> Option<&MutationDescriptor> {
        self.mutations.get(name)
    }

    pub fn mutations(&self) -> impl Iterator<Item = &MutationDescriptor> {
        self.mutations.values()
    }

    /// The input wrapper field a runtime input instance of `host_type` binds
    /// to, for the named mutation.
    pub fn mutation_input_field(
        &self,
        mutation: &str,
        host_type: &HostTypeId,
    ) -> Option<&str> {
        self.mutation_input_field_by_host
            .get(&(mutation.to_string(), host_type.clone()))
            .map(String::as_str)
    }

    /// The output wrapper type registered for the named mutation's return
    /// host type.
    pub fn mutation_output_type(
        &self,
        mutation: &str,
        host_type: &HostTypeId,
    ) -> Option<&str> {
        self.mutation_output_type_by_host
            .get(&(mutation.to_string(), host_type.clone()))
            .map(String::as_str)
    }

    /// Field lookup on a named type.
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDescriptor> {
        self.types.get(type_name).and_then(|t| t.field(field_name))
    }

    pub fn scalar_coercion(&self, scalar_name: &str) -> Coercion {
        self.scalar_coercions
            .get(scalar_name)
            .cloned()
            .unwrap_or(Coercion::Identity)
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &Arc<dyn ExpressionEvaluator> {
        &self.evaluator
    }
}
