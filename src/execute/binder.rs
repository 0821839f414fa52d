//! Field resolution binder
//!
//! Turns a name→value argument map into the positional argument list a
//! resolver callback expects. Visible input parameters bind by name, with the
//! build-time default as fallback; everything else binds by host-type match
//! against the caller-supplied fallback list (context and source objects).
//! Unknown keys in the named map are ignored, so old resolvers keep working
//! against newer callers. Binding itself never fails: unmatched parameters
//! bind to null and any downstream invocation failure is reported as a
//! per-field error by the engine.

use crate::model::HostTypeId;
use crate::schema::types::{ParamBinding, ParamPlan};
use serde_json::{Map, Value};

/// Bind a resolver's formal parameters to positional values.
///
/// The pass-through rule: a query-style resolver invoked with no named
/// arguments at all, declaring exactly one parameter of the parent's host
/// type, receives the parent value in that parameter. This lets one resolver
/// method serve both as a root field and as a projection over its parent.
/// Mutations never pass through.
pub fn bind_parameters(
    params: &[ParamPlan],
    named: &Map<String, Value>,
    fallback_by_type: &[(HostTypeId, Value)],
    parent: Option<(&HostTypeId, &Value)>,
    is_mutation: bool,
) -> Vec<Value> {
    let mut any_input_bound = false;
    let mut values: Vec<Value> = params
        .iter()
        .map(|plan| match &plan.binding {
            ParamBinding::Input {
                name,
                default_value,
            } => match named.get(name) {
                Some(value) => {
                    any_input_bound = true;
                    value.clone()
                }
                None => default_value.clone().unwrap_or(Value::Null),
            },
            ParamBinding::ByType => fallback_by_type
                .iter()
                .find(|(host, _)| *host == plan.target_type)
                .map(|(_, value)| value.clone())
                .unwrap_or(Value::Null),
        })
        .collect();

    if !is_mutation && !any_input_bound {
        if let Some((parent_host, parent_value)) = parent {
            let mut assignable = params
                .iter()
                .enumerate()
                .filter(|(_, plan)| plan.target_type == *parent_host);
            if let (Some((index, _)), None) = (assignable.next(), assignable.next()) {
                values[index] = parent_value.clone();
            }
        }
    }

    values
}
