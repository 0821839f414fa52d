//! Schema configuration loading and management

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Configuration for schema building and execution.
///
/// All knobs have defaults matching the conventional Relay-style wiring:
/// mutations take a single `input` argument wrapping their parameters plus a
/// `clientMutationId` correlation field, and echo that id back through an
/// `...Payload` output wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Name of the client-correlation-id field injected into mutation wrappers
    pub client_mutation_id_name: String,

    /// Whether the query template generator injects a generated correlation id
    pub inject_client_mutation_id: bool,

    /// Whether the correlation-id wrapper fields are nullable
    pub allow_empty_client_mutation_id: bool,

    /// Name of the single argument carrying a mutation's input wrapper
    pub mutation_input_argument_name: String,

    /// Suffix appended to a mutation name to form its output wrapper type name
    pub output_object_name_suffix: String,

    /// Suffix appended to a mutation name to form its input wrapper type name
    pub input_object_name_suffix: String,

    /// Exposed name of the mutation root object type
    pub schema_mutation_object_name: String,

    /// Represent date-like host types as integer epoch milliseconds.
    /// When false they are exposed as strings in `date_format`.
    pub date_as_timestamp: bool,

    /// chrono format string used when `date_as_timestamp` is false
    pub date_format: String,

    /// Field on runtime values naming their host type, used to resolve the
    /// concrete type behind interface- and union-typed fields
    pub type_tag_field_name: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            client_mutation_id_name: "clientMutationId".to_string(),
            inject_client_mutation_id: true,
            allow_empty_client_mutation_id: false,
            mutation_input_argument_name: "input".to_string(),
            output_object_name_suffix: "Payload".to_string(),
            input_object_name_suffix: "Input".to_string(),
            schema_mutation_object_name: "Mutation".to_string(),
            date_as_timestamp: true,
            date_format: "%Y-%m-%dT%H:%M:%SZ".to_string(),
            type_tag_field_name: "__type".to_string(),
        }
    }
}

impl SchemaConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchemaConfig::default();
        assert_eq!(config.client_mutation_id_name, "clientMutationId");
        assert_eq!(config.mutation_input_argument_name, "input");
        assert_eq!(config.output_object_name_suffix, "Payload");
        assert!(config.date_as_timestamp);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = SchemaConfig::default();
        let yaml = serde_yaml::to_string(&config).expect("serialize should succeed");
        let parsed = SchemaConfig::from_yaml_str(&yaml).expect("parse should succeed");
        assert_eq!(parsed.input_object_name_suffix, config.input_object_name_suffix);
        assert_eq!(parsed.type_tag_field_name, config.type_tag_field_name);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let parsed = SchemaConfig::from_yaml_str("date_as_timestamp: false\n")
            .expect("parse should succeed");
        assert!(!parsed.date_as_timestamp);
        assert_eq!(parsed.schema_mutation_object_name, "Mutation");
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "mutation_input_argument_name: payload").expect("write should succeed");
        let path = file.path().to_str().expect("utf-8 path");

        let config = SchemaConfig::from_yaml_file(path).expect("load should succeed");
        assert_eq!(config.mutation_input_argument_name, "payload");
        assert_eq!(config.client_mutation_id_name, "clientMutationId");
    }
}
