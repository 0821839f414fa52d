//! Execution results
//!
//! Callers always receive an [`ExecutionResult`], never an error: fatal
//! pre-execution failures (syntax, validation) and the complexity-limit
//! breach come back as error-only results, and per-field resolver failures
//! ride alongside the data produced by the sibling branches that succeeded.

use crate::core::ErrorEntry;
use serde::Serialize;
use serde_json::Value;

/// The outcome of one query execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub data: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorEntry>,
    /// The query's total complexity score, summed over the root fields.
    pub complexity: f64,
}

impl ExecutionResult {
    pub fn new(data: Value, errors: Vec<ErrorEntry>, complexity: f64) -> Self {
        Self {
            data,
            errors,
            complexity,
        }
    }

    /// A result carrying no data at all, for fatal failures.
    pub fn errors_only(errors: Vec<ErrorEntry>) -> Self {
        Self {
            data: Value::Null,
            errors,
            complexity: 0.0,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}
