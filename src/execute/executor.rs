//! Query executor entry point
//!
//! The fluent front door over the engine: parse, validate, pick the
//! operation, then run it. Parse and validation failures short-circuit into
//! error-only results before any resolver runs. The executor borrows the
//! schema index, so one index serves any number of concurrent executions.

use crate::core::ErrorEntry;
use crate::execute::engine::Engine;
use crate::execute::result::ExecutionResult;
use crate::execute::strategy::ExecutionStrategy;
use crate::model::HostTypeId;
use crate::schema::SchemaIndex;
use async_trait::async_trait;
use graphql_parser::query::{
    parse_query, Definition, Document, OperationDefinition, Value as GqlValue,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Validation collaborator, run between parsing and execution.
///
/// The engine executes only when validation returns no errors. Validation is
/// async so rule sets can consult external state (persisted queries, rate
/// budgets). The default is [`NoopValidator`]; embedding applications plug in
/// a real rule set.
#[async_trait]
pub trait QueryValidator: Send + Sync {
    async fn validate(
        &self,
        schema: &SchemaIndex,
        document: &Document<'_, String>,
    ) -> Vec<ErrorEntry>;
}

/// Accepts every document.
pub struct NoopValidator;

#[async_trait]
impl QueryValidator for NoopValidator {
    async fn validate(
        &self,
        _schema: &SchemaIndex,
        _document: &Document<'_, String>,
    ) -> Vec<ErrorEntry> {
        Vec::new()
    }
}

/// One query execution, configured fluently.
pub struct QueryExecutor<'s> {
    schema: &'s SchemaIndex,
    query: String,
    operation_name: Option<String>,
    variables: Map<String, Value>,
    context: Vec<(HostTypeId, Value)>,
    root_value: Value,
    strategy: ExecutionStrategy,
    max_depth: i32,
    max_complexity: f64,
    validator: Arc<dyn QueryValidator>,
}

impl<'s> QueryExecutor<'s> {
    /// Start configuring an execution against a built schema. Depth and
    /// complexity limits start disabled.
    pub fn create(schema: &'s SchemaIndex) -> Self {
        Self {
            schema,
            query: String::new(),
            operation_name: None,
            variables: Map::new(),
            context: Vec::new(),
            root_value: Value::Null,
            strategy: ExecutionStrategy::default(),
            max_depth: -1,
            max_complexity: -1.0,
            validator: Arc::new(NoopValidator),
        }
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    pub fn variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    pub fn variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// Register a context object bound into non-visible resolver parameters
    /// by host type.
    pub fn context(mut self, host_type: impl Into<HostTypeId>, value: Value) -> Self {
        self.context.push((host_type.into(), value));
        self
    }

    /// The value property fields of the query root resolve against.
    pub fn root_value(mut self, value: Value) -> Self {
        self.root_value = value;
        self
    }

    pub fn strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Soft depth limit; zero or negative disables it.
    pub fn max_depth(mut self, max_depth: i32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Hard complexity limit; zero or negative disables it.
    pub fn max_complexity(mut self, max_complexity: f64) -> Self {
        self.max_complexity = max_complexity;
        self
    }

    pub fn validator(mut self, validator: Arc<dyn QueryValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Run the configured execution. Always returns a result object.
    pub async fn execute(&self) -> ExecutionResult {
        info!(
            operation = self.operation_name.as_deref().unwrap_or("<default>"),
            strategy = ?self.strategy,
            "executing query"
        );

        let document = match parse_query::<String>(&self.query) {
            Ok(document) => document,
            Err(parse_error) => {
                return ExecutionResult::errors_only(vec![ErrorEntry::syntax(
                    parse_error.to_string(),
                )])
            }
        };

        let validation_errors = self.validator.validate(self.schema, &document).await;
        if !validation_errors.is_empty() {
            return ExecutionResult::errors_only(validation_errors);
        }

        let mut fragments = HashMap::new();
        for definition in &document.definitions {
            if let Definition::Fragment(fragment) = definition {
                fragments.insert(fragment.name.as_str(), fragment);
            }
        }

        let Some(operation) = select_operation(&document, self.operation_name.as_deref()) else {
            return ExecutionResult::errors_only(vec![ErrorEntry::validation(
                match &self.operation_name {
                    Some(name) => format!("operation '{name}' not found in document"),
                    None => "no operation found in document".to_string(),
                },
            )]);
        };

        let mut variables = self.variables.clone();
        for definition in variable_definitions(operation) {
            if !variables.contains_key(&definition.name) {
                if let Some(default) = &definition.default_value {
                    variables.insert(definition.name.clone(), constant_to_json(default));
                }
            }
        }

        // mutations never run concurrently, whatever the caller chose
        let concurrency = match operation {
            OperationDefinition::Mutation(_) => 1,
            _ => self.strategy.concurrency(),
        };

        let engine = Engine {
            schema: self.schema,
            variables,
            fragments,
            fallbacks: &self.context,
            root_value: Arc::new(self.root_value.clone()),
            max_depth: self.max_depth,
            max_complexity: self.max_complexity,
            concurrency,
        };
        engine.run(operation).await
    }
}

fn select_operation<'a, 'd>(
    document: &'a Document<'d, String>,
    operation_name: Option<&str>,
) -> Option<&'a OperationDefinition<'d, String>> {
    let mut operations = document.definitions.iter().filter_map(|definition| {
        if let Definition::Operation(operation) = definition {
            Some(operation)
        } else {
            None
        }
    });
    match operation_name {
        None => operations.next(),
        Some(wanted) => operations.find(|operation| {
            let name = match operation {
                OperationDefinition::SelectionSet(_) => None,
                OperationDefinition::Query(query) => query.name.as_deref(),
                OperationDefinition::Mutation(mutation) => mutation.name.as_deref(),
                OperationDefinition::Subscription(subscription) => subscription.name.as_deref(),
            };
            name == Some(wanted)
        }),
    }
}

fn variable_definitions<'a, 'd>(
    operation: &'a OperationDefinition<'d, String>,
) -> &'a [graphql_parser::query::VariableDefinition<'d, String>] {
    match operation {
        OperationDefinition::SelectionSet(_) => &[],
        OperationDefinition::Query(query) => &query.variable_definitions,
        OperationDefinition::Mutation(mutation) => &mutation.variable_definitions,
        OperationDefinition::Subscription(subscription) => &subscription.variable_definitions,
    }
}

/// Convert a constant document value (a variable default) to JSON.
fn constant_to_json(value: &GqlValue<'_, String>) -> Value {
    match value {
        GqlValue::Null | GqlValue::Variable(_) => Value::Null,
        GqlValue::Int(i) => Value::from(i.as_i64().unwrap_or(0)),
        GqlValue::Float(f) => Value::from(*f),
        GqlValue::String(s) => Value::String(s.clone()),
        GqlValue::Boolean(b) => Value::Bool(*b),
        GqlValue::Enum(e) => Value::String(e.clone()),
        GqlValue::List(list) => Value::Array(list.iter().map(constant_to_json).collect()),
        GqlValue::Object(object) => {
            let mut map = Map::new();
            for (name, item) in object {
                map.insert(name.clone(), constant_to_json(item));
            }
            Value::Object(map)
        }
    }
}
