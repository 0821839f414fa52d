//! Mutation query template generation
//!
//! A convenience generator over the schema index, not part of the execution
//! engine: given a registered mutation and example input object instances, it
//! derives a minimal runnable query text plus the single nested variable map
//! the query expects. Callers point it at a mutation by name; input instances
//! are matched to their wrapper fields through the binding index the builder
//! recorded, and a generated client-correlation id is injected when the
//! configuration asks for one.

use crate::core::SchemaError;
use crate::model::HostTypeId;
use crate::schema::types::TypeKind;
use crate::schema::SchemaIndex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use uuid::Uuid;

/// A generated mutation query and its variable map.
#[derive(Debug, Clone)]
pub struct MutationQuery {
    pub query: String,
    pub variables: Value,
}

/// Derives runnable mutation queries from the schema index.
pub struct MutationQueryTemplate<'s> {
    schema: &'s SchemaIndex,
}

impl<'s> MutationQueryTemplate<'s> {
    pub fn new(schema: &'s SchemaIndex) -> Self {
        Self { schema }
    }

    /// Build the query text and variables for the named mutation.
    ///
    /// Each `(host type, value)` pair in `inputs` lands in the wrapper field
    /// the builder registered for that host type; pairs with no registered
    /// field are skipped.
    pub fn for_mutation(
        &self,
        name: &str,
        inputs: &[(HostTypeId, Value)],
    ) -> Result<MutationQuery, SchemaError> {
        let mutation = self
            .schema
            .mutation(name)
            .ok_or_else(|| SchemaError::UnknownMutation {
                name: name.to_string(),
            })?;
        let config = self.schema.config();
        let argument = &config.mutation_input_argument_name;

        let selection = self.expand(&mutation.output_type_name, &mut HashSet::new());
        let query = format!(
            "mutation {name}Query(${argument}: {input_type}!) {{ {name}({argument}: ${argument}) {selection} }}",
            input_type = mutation.input_type_name,
        );

        let mut input = Map::new();
        if config.inject_client_mutation_id {
            input.insert(
                config.client_mutation_id_name.clone(),
                Value::String(Uuid::new_v4().to_string()),
            );
        }
        for (host_type, value) in inputs {
            if let Some(field) = self.schema.mutation_input_field(name, host_type) {
                input.insert(field.to_string(), value.clone());
            }
        }
        let mut variables = Map::new();
        variables.insert(argument.clone(), Value::Object(input));

        Ok(MutationQuery {
            query,
            variables: Value::Object(variables),
        })
    }

    /// Expand a type into the selection of all its scalar leaves, descending
    /// through nested objects. The visited set breaks reference cycles per
    /// path; a type already on the current path stops expanding.
    fn expand(&self, type_name: &str, visited: &mut HashSet<String>) -> String {
        let Some(descriptor) = self.schema.type_named(type_name) else {
            return String::new();
        };
        if !visited.insert(type_name.to_string()) {
            return String::new();
        }

        let mut parts = Vec::new();
        for field in &descriptor.fields {
            let target = field.field_type.type_ref.name();
            match self.schema.type_named(target).map(|t| t.kind) {
                Some(TypeKind::Scalar | TypeKind::Enum) => parts.push(field.name.clone()),
                Some(TypeKind::Object | TypeKind::Interface) => {
                    let nested = self.expand(target, visited);
                    if !nested.is_empty() {
                        parts.push(format!("{} {}", field.name, nested));
                    }
                }
                _ => {}
            }
        }
        visited.remove(type_name);

        if parts.is_empty() {
            String::new()
        } else {
            format!("{{ {} }}", parts.join(" "))
        }
    }
}
