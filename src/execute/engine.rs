//! Concurrent query execution engine
//!
//! Walks a parsed query depth-first against the schema index. Sibling fields
//! are resolved through a bounded stream whose width comes from the chosen
//! strategy, so sequential execution and task-parallel execution share one
//! code path; result maps always preserve request order and list elements are
//! index-tagged and re-sorted after completion, so the produced data is
//! identical under either strategy.
//!
//! Depth limiting is soft: a selection set past the limit is abandoned and
//! its parent field completes to null. The complexity limit is hard: the
//! first field whose bottom-up score breaches it aborts the whole execution
//! into an error-only result.

use crate::core::{ErrorEntry, Location, PathSegment};
use crate::execute::binder::bind_parameters;
use crate::execute::result::ExecutionResult;
use crate::model::HostTypeId;
use crate::schema::scalars::Coercion;
use crate::schema::types::{FieldSource, TypeDescriptor, TypeKind, TypeRef};
use crate::schema::SchemaIndex;
use chrono::{DateTime, TimeZone, Utc};
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use graphql_parser::query::{
    Field, FragmentDefinition, OperationDefinition, Selection, SelectionSet, TypeCondition,
    Value as GqlValue,
};
use graphql_parser::Pos;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A field's own traversal cost in the additive default.
const NODE_SCORE: f64 = 1.0;

/// Variable carrying the combined child complexity into cost expressions.
const CHILD_SCORE_VAR: &str = "childScore";

/// Depth assigned to root mutation fields. Query roots start at 0.
const MUTATION_ROOT_DEPTH: i32 = 1;

/// Fatal mid-execution abort. The only producer is the complexity check;
/// everything else degrades to per-field errors.
pub(crate) struct Abort(pub ErrorEntry);

struct FieldOutcome {
    key: String,
    value: Value,
    score: f64,
    errors: Vec<ErrorEntry>,
}

struct Completed {
    value: Value,
    score: f64,
    errors: Vec<ErrorEntry>,
}

impl Completed {
    fn null() -> Self {
        Self {
            value: Value::Null,
            score: 0.0,
            errors: Vec::new(),
        }
    }
}

pub(crate) struct Engine<'a> {
    pub schema: &'a SchemaIndex,
    pub variables: Map<String, Value>,
    pub fragments: HashMap<&'a str, &'a FragmentDefinition<'a, String>>,
    /// Context objects bound into non-visible resolver parameters by type.
    pub fallbacks: &'a [(HostTypeId, Value)],
    pub root_value: Arc<Value>,
    pub max_depth: i32,
    pub max_complexity: f64,
    pub concurrency: usize,
}

impl<'a> Engine<'a> {
    pub(crate) async fn run(
        &'a self,
        operation: &'a OperationDefinition<'a, String>,
    ) -> ExecutionResult {
        match operation {
            OperationDefinition::SelectionSet(set) => self.run_query(set).await,
            OperationDefinition::Query(query) => self.run_query(&query.selection_set).await,
            OperationDefinition::Mutation(mutation) => {
                self.run_mutation(&mutation.selection_set).await
            }
            OperationDefinition::Subscription(_) => ExecutionResult::errors_only(vec![
                ErrorEntry::validation("subscriptions are not supported"),
            ]),
        }
    }

    async fn run_query(&'a self, set: &'a SelectionSet<'a, String>) -> ExecutionResult {
        let root = self.schema.query_type().as_ref();
        match self
            .resolve_selection_set(root, self.root_value.clone(), set, 0, Vec::new())
            .await
        {
            Ok(outcome) => ExecutionResult::new(outcome.value, outcome.errors, outcome.score),
            Err(Abort(entry)) => ExecutionResult::errors_only(vec![entry]),
        }
    }

    async fn run_mutation(&'a self, set: &'a SelectionSet<'a, String>) -> ExecutionResult {
        let Some(root) = self.schema.mutation_type() else {
            return ExecutionResult::errors_only(vec![ErrorEntry::validation(
                "no mutations are registered",
            )]);
        };
        let mut data = Map::new();
        let mut errors = Vec::new();
        let mut complexity = 0.0;
        // strictly sequential, in document order, regardless of strategy
        for field in self.collect_fields(set, &root.name) {
            let path = vec![PathSegment::Field(response_key(field).to_string())];
            match self.resolve_mutation_field(field, path).await {
                Ok(outcome) => {
                    complexity += outcome.score;
                    if self.max_complexity > 0.0 && complexity > self.max_complexity {
                        return ExecutionResult::errors_only(vec![ErrorEntry::complexity_limit(
                            complexity,
                            self.max_complexity,
                        )]);
                    }
                    errors.extend(outcome.errors);
                    data.insert(outcome.key, outcome.value);
                }
                Err(Abort(entry)) => return ExecutionResult::errors_only(vec![entry]),
            }
        }
        ExecutionResult::new(Value::Object(data), errors, complexity)
    }

    /// Resolve every field of one selection set against `parent`.
    fn resolve_selection_set(
        &'a self,
        type_desc: &'a TypeDescriptor,
        parent: Arc<Value>,
        set: &'a SelectionSet<'a, String>,
        depth: i32,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'a, Result<Completed, Abort>> {
        Box::pin(async move {
            if self.max_depth > 0 && depth > self.max_depth {
                debug!(type_name = %type_desc.name, depth, "depth limit reached, abandoning subtree");
                return Ok(Completed::null());
            }

            let resolutions: Vec<_> = self
                .collect_fields(set, &type_desc.name)
                .into_iter()
                .map(|field| {
                    let mut field_path = path.clone();
                    field_path.push(PathSegment::Field(response_key(field).to_string()));
                    self.resolve_field(type_desc, field, parent.clone(), depth, field_path)
                })
                .collect();
            let outcomes: Vec<Result<FieldOutcome, Abort>> = stream::iter(resolutions)
                .buffered(self.concurrency)
                .collect()
                .await;

            let mut data = Map::new();
            let mut score = 0.0;
            let mut errors = Vec::new();
            for outcome in outcomes {
                let outcome = outcome?;
                score += outcome.score;
                if self.max_complexity > 0.0 && score > self.max_complexity {
                    return Err(Abort(ErrorEntry::complexity_limit(score, self.max_complexity)));
                }
                errors.extend(outcome.errors);
                data.insert(outcome.key, outcome.value);
            }
            Ok(Completed {
                value: Value::Object(data),
                score,
                errors,
            })
        })
    }

    fn resolve_field(
        &'a self,
        type_desc: &'a TypeDescriptor,
        field: &'a Field<'a, String>,
        parent: Arc<Value>,
        depth: i32,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'a, Result<FieldOutcome, Abort>> {
        Box::pin(async move {
            let key = response_key(field).to_string();
            let Some(descriptor) = type_desc.field(&field.name) else {
                return Ok(FieldOutcome {
                    key,
                    value: Value::Null,
                    score: 0.0,
                    errors: vec![ErrorEntry::field_resolution(
                        &format!("{}.{}", type_desc.name, field.name),
                        &"field is not part of the schema",
                        path,
                        vec![location(field.position)],
                    )],
                });
            };

            let named = self.argument_values(descriptor, field);
            let (raw, mut errors) = match &descriptor.source {
                FieldSource::Property { member_name } => (
                    property_value(&parent, &descriptor.name, member_name),
                    Vec::new(),
                ),
                FieldSource::Method(invoker) => {
                    let parent_pair = type_desc.host_type.as_ref().map(|host| (host, &*parent));
                    let args =
                        bind_parameters(&invoker.params, &named, self.fallbacks, parent_pair, false);
                    match (invoker.invoke)(invoker.instance.clone(), args).await {
                        Ok(value) => (value, Vec::new()),
                        Err(cause) => {
                            warn!(resolver = %invoker.identity(), %cause, "resolver failed");
                            (
                                Value::Null,
                                vec![ErrorEntry::field_resolution(
                                    &invoker.identity(),
                                    &cause,
                                    path.clone(),
                                    vec![location(field.position)],
                                )],
                            )
                        }
                    }
                }
            };

            let completed = self
                .complete_value(
                    &descriptor.field_type.type_ref,
                    descriptor.field_type.is_list,
                    &field.selection_set,
                    raw,
                    depth,
                    path.clone(),
                )
                .await?;
            errors.extend(completed.errors);

            let score = self.score_for(
                &descriptor.name,
                descriptor.cost_expression.as_deref(),
                completed.score,
                &named,
                &mut errors,
                &path,
            );
            if self.max_complexity > 0.0 && score > self.max_complexity {
                return Err(Abort(ErrorEntry::complexity_limit(score, self.max_complexity)));
            }

            Ok(FieldOutcome {
                key,
                value: completed.value,
                score,
                errors,
            })
        })
    }

    /// Complete a raw resolver value against the field's declared type.
    fn complete_value(
        &'a self,
        type_ref: &'a TypeRef,
        is_list: bool,
        set: &'a SelectionSet<'a, String>,
        raw: Value,
        depth: i32,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'a, Result<Completed, Abort>> {
        Box::pin(async move {
            if raw.is_null() {
                return Ok(Completed::null());
            }

            if is_list {
                let items = match raw {
                    Value::Array(items) => items,
                    other => vec![other],
                };
                let elements = items.into_iter().enumerate().map(|(index, item)| {
                    let mut element_path = path.clone();
                    element_path.push(PathSegment::Index(index));
                    let completion =
                        self.complete_value(type_ref, false, set, item, depth, element_path);
                    async move { (index, completion.await) }
                });
                // elements may finish out of order; the index tag restores
                // input order before the merge
                let mut tagged: Vec<(usize, Result<Completed, Abort>)> = stream::iter(elements)
                    .buffer_unordered(self.concurrency)
                    .collect()
                    .await;
                tagged.sort_by_key(|(index, _)| *index);

                let mut values = Vec::with_capacity(tagged.len());
                let mut score = 0.0;
                let mut errors = Vec::new();
                for (_, outcome) in tagged {
                    let outcome = outcome?;
                    values.push(outcome.value);
                    score += outcome.score;
                    errors.extend(outcome.errors);
                }
                return Ok(Completed {
                    value: Value::Array(values),
                    score,
                    errors,
                });
            }

            let Some(target) = self.schema.type_named(type_ref.name()) else {
                return Ok(Completed::null());
            };
            match target.kind {
                TypeKind::Scalar => Ok(Completed {
                    value: coerce_scalar(&self.schema.scalar_coercion(&target.name), raw),
                    score: 0.0,
                    errors: Vec::new(),
                }),
                TypeKind::Enum => Ok(Completed {
                    value: complete_enum(target, raw),
                    score: 0.0,
                    errors: Vec::new(),
                }),
                TypeKind::Object => {
                    self.resolve_selection_set(target.as_ref(), Arc::new(raw), set, depth + 1, path)
                        .await
                }
                TypeKind::Interface | TypeKind::Union => match self.concrete_type(&raw) {
                    Some(concrete) => {
                        self.resolve_selection_set(
                            concrete.as_ref(),
                            Arc::new(raw),
                            set,
                            depth + 1,
                            path,
                        )
                        .await
                    }
                    None => Ok(Completed::null()),
                },
                TypeKind::InputObject => Ok(Completed::null()),
            }
        })
    }

    async fn resolve_mutation_field(
        &'a self,
        field: &'a Field<'a, String>,
        path: Vec<PathSegment>,
    ) -> Result<FieldOutcome, Abort> {
        let key = response_key(field).to_string();
        let Some(mutation) = self.schema.mutation(&field.name) else {
            return Ok(FieldOutcome {
                key,
                value: Value::Null,
                score: 0.0,
                errors: vec![
                    ErrorEntry::validation(format!("unknown mutation '{}'", field.name))
                        .at_path(path),
                ],
            });
        };

        let config = self.schema.config();
        let input = field
            .arguments
            .iter()
            .find(|(name, _)| *name == config.mutation_input_argument_name)
            .map(|(_, value)| self.gql_value_to_json(value))
            .unwrap_or(Value::Null);
        let input_map = match input {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let client_mutation_id = input_map
            .get(&config.client_mutation_id_name)
            .cloned()
            .unwrap_or(Value::Null);

        let args = bind_parameters(&mutation.invoker.params, &input_map, self.fallbacks, None, true);
        let (returned, mut errors) =
            match (mutation.invoker.invoke)(mutation.invoker.instance.clone(), args).await {
                Ok(value) => (value, Vec::new()),
                Err(cause) => {
                    warn!(mutation = %mutation.name, %cause, "mutation resolver failed");
                    (
                        Value::Null,
                        vec![ErrorEntry::field_resolution(
                            &mutation.invoker.identity(),
                            &cause,
                            path.clone(),
                            vec![location(field.position)],
                        )],
                    )
                }
            };

        // the correlation id echoes back alongside the declared return field
        let mut wrapped = Map::new();
        wrapped.insert(config.client_mutation_id_name.clone(), client_mutation_id);
        wrapped.insert(mutation.output_field_name.clone(), returned);

        let Some(output_type) = self.schema.type_named(&mutation.output_type_name) else {
            return Ok(FieldOutcome {
                key,
                value: Value::Null,
                score: 0.0,
                errors,
            });
        };
        let completed = self
            .resolve_selection_set(
                output_type.as_ref(),
                Arc::new(Value::Object(wrapped)),
                &field.selection_set,
                MUTATION_ROOT_DEPTH + 1,
                path.clone(),
            )
            .await?;
        errors.extend(completed.errors);

        let score = self.score_for(
            &mutation.name,
            mutation.cost_expression.as_deref(),
            completed.score,
            &input_map,
            &mut errors,
            &path,
        );
        if self.max_complexity > 0.0 && score > self.max_complexity {
            return Err(Abort(ErrorEntry::complexity_limit(score, self.max_complexity)));
        }

        Ok(FieldOutcome {
            key,
            value: completed.value,
            score,
            errors,
        })
    }

    /// Bottom-up field score: the cost expression when one is declared,
    /// otherwise children plus the field's own unit cost.
    fn score_for(
        &self,
        identity: &str,
        cost_expression: Option<&str>,
        child_score: f64,
        named: &Map<String, Value>,
        errors: &mut Vec<ErrorEntry>,
        path: &[PathSegment],
    ) -> f64 {
        let Some(expression) = cost_expression else {
            return child_score + NODE_SCORE;
        };
        let mut bindings: HashMap<String, Value> = named
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        bindings.insert(CHILD_SCORE_VAR.to_string(), Value::from(child_score));
        match self.schema.evaluator().evaluate(expression, &bindings) {
            Ok(value) => value.as_f64().unwrap_or(child_score + NODE_SCORE),
            Err(cause) => {
                errors.push(ErrorEntry::field_resolution(
                    identity,
                    &cause,
                    path.to_vec(),
                    Vec::new(),
                ));
                child_score + NODE_SCORE
            }
        }
    }

    /// Flatten a selection set into its fields, expanding fragment spreads
    /// and inline fragments whose condition applies to the concrete type.
    fn collect_fields(
        &'a self,
        set: &'a SelectionSet<'a, String>,
        type_name: &str,
    ) -> Vec<&'a Field<'a, String>> {
        let mut fields = Vec::new();
        self.collect_fields_into(set, type_name, &mut fields);
        fields
    }

    fn collect_fields_into(
        &'a self,
        set: &'a SelectionSet<'a, String>,
        type_name: &str,
        fields: &mut Vec<&'a Field<'a, String>>,
    ) {
        for selection in &set.items {
            match selection {
                Selection::Field(field) => fields.push(field),
                Selection::FragmentSpread(spread) => {
                    if let Some(fragment) = self.fragments.get(spread.fragment_name.as_str()) {
                        let TypeCondition::On(condition) = &fragment.type_condition;
                        if self.fragment_applies(condition, type_name) {
                            self.collect_fields_into(&fragment.selection_set, type_name, fields);
                        }
                    }
                }
                Selection::InlineFragment(inline) => {
                    let applies = match &inline.type_condition {
                        Some(TypeCondition::On(condition)) => {
                            self.fragment_applies(condition, type_name)
                        }
                        None => true,
                    };
                    if applies {
                        self.collect_fields_into(&inline.selection_set, type_name, fields);
                    }
                }
            }
        }
    }

    fn fragment_applies(&self, condition: &str, type_name: &str) -> bool {
        if condition == type_name {
            return true;
        }
        if let Some(concrete) = self.schema.type_named(type_name) {
            if concrete.interfaces.iter().any(|i| i.name() == condition) {
                return true;
            }
        }
        match self.schema.type_named(condition) {
            Some(abstract_type) if abstract_type.kind == TypeKind::Union => abstract_type
                .possible_types
                .iter()
                .any(|p| p.name() == type_name),
            _ => false,
        }
    }

    /// The concrete object type behind an interface- or union-typed value,
    /// read from the value's type tag field.
    fn concrete_type(&self, value: &Value) -> Option<&Arc<TypeDescriptor>> {
        let tag = value
            .get(self.schema.config().type_tag_field_name.as_str())?
            .as_str()?;
        self.schema.object_type_for_host(&HostTypeId::from(tag))
    }

    /// Query-supplied arguments merged over the build-time defaults.
    fn argument_values(
        &self,
        descriptor: &crate::schema::types::FieldDescriptor,
        field: &Field<'_, String>,
    ) -> Map<String, Value> {
        let mut named = Map::new();
        for (name, value) in &field.arguments {
            named.insert(name.clone(), self.gql_value_to_json(value));
        }
        for argument in &descriptor.arguments {
            if !named.contains_key(&argument.name) {
                if let Some(default) = &argument.default_value {
                    named.insert(argument.name.clone(), default.clone());
                }
            }
        }
        named
    }

    fn gql_value_to_json(&self, value: &GqlValue<'_, String>) -> Value {
        match value {
            GqlValue::Null => Value::Null,
            GqlValue::Int(i) => Value::from(i.as_i64().unwrap_or(0)),
            GqlValue::Float(f) => Value::from(*f),
            GqlValue::String(s) => Value::String(s.clone()),
            GqlValue::Boolean(b) => Value::Bool(*b),
            GqlValue::Enum(e) => Value::String(e.clone()),
            GqlValue::List(list) => {
                Value::Array(list.iter().map(|v| self.gql_value_to_json(v)).collect())
            }
            GqlValue::Object(object) => {
                let mut map = Map::new();
                for (name, item) in object {
                    map.insert(name.clone(), self.gql_value_to_json(item));
                }
                Value::Object(map)
            }
            GqlValue::Variable(name) => self
                .variables
                .get(name.as_str())
                .cloned()
                .unwrap_or(Value::Null),
        }
    }
}

fn response_key<'a>(field: &'a Field<'a, String>) -> &'a str {
    field.alias.as_deref().unwrap_or(&field.name)
}

fn location(position: Pos) -> Location {
    Location {
        line: position.line,
        column: position.column,
    }
}

/// Key lookup on the parent value: exposed name first, then the declared
/// member identifier.
fn property_value(parent: &Value, exposed_name: &str, member_name: &str) -> Value {
    match parent {
        Value::Object(map) => map
            .get(exposed_name)
            .or_else(|| map.get(member_name))
            .cloned()
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn coerce_scalar(coercion: &Coercion, value: Value) -> Value {
    match coercion {
        Coercion::Identity => value,
        Coercion::EpochMillis => match value {
            Value::String(text) => DateTime::parse_from_rfc3339(&text)
                .map(|parsed| Value::from(parsed.timestamp_millis()))
                .unwrap_or(Value::String(text)),
            other => other,
        },
        Coercion::FormatDate(format) => match value {
            Value::Number(number) => number
                .as_i64()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
                .map(|parsed| Value::String(parsed.format(format).to_string()))
                .unwrap_or(Value::Number(number)),
            Value::String(text) => DateTime::parse_from_rfc3339(&text)
                .map(|parsed| Value::String(parsed.format(format).to_string()))
                .unwrap_or(Value::String(text)),
            other => other,
        },
    }
}

/// Map a resolved internal enum value back to its exposed label.
fn complete_enum(descriptor: &TypeDescriptor, value: Value) -> Value {
    for enum_value in &descriptor.enum_values {
        if enum_value.value == value {
            return Value::String(enum_value.label.clone());
        }
    }
    if let Value::String(label) = &value {
        if descriptor.enum_values.iter().any(|ev| ev.label == *label) {
            return value;
        }
    }
    Value::Null
}
