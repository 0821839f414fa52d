//! Typed error handling for graphforge
//!
//! Two families of errors exist, with deliberately different propagation:
//!
//! - [`SchemaError`]: fatal build-time errors. Graph construction aborts
//!   entirely; no partial schema is ever usable.
//! - [`ErrorEntry`]: execution-side errors attached to an
//!   [`ExecutionResult`](crate::execute::ExecutionResult). Callers always
//!   receive a result object; resolver failures are collected per field while
//!   sibling branches continue to populate data.

use serde::Serialize;
use thiserror::Error;

/// Fatal errors raised while building the schema graph.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema host type declares no root query field.
    #[error("no schema root query field declared")]
    MissingRootQuery,

    /// Two distinct host types map to the same exposed type name.
    #[error("duplicate type name '{name}' declared by host types '{first}' and '{second}'")]
    DuplicateTypeName {
        name: String,
        first: String,
        second: String,
    },

    /// A mutation wrapper type name collides with an already registered type.
    #[error("mutation '{mutation}' wrapper type name '{name}' collides with a registered type")]
    WrapperNameCollision { mutation: String, name: String },

    /// A member or parameter references a host type missing from the model.
    #[error("unknown host type '{id}' referenced from '{referenced_from}'")]
    UnknownHostType { id: String, referenced_from: String },

    /// No service instance is registered for a resolver method's host type.
    #[error("no service registered for resolver '{host_type}.{field}'")]
    MissingResolverService { host_type: String, field: String },

    /// A named type reference was never resolved by the finalize pass.
    #[error("dangling type reference '{name}'")]
    DanglingReference { name: String },

    /// The requested mutation does not exist in the schema index.
    #[error("unknown mutation '{name}'")]
    UnknownMutation { name: String },

    /// A structural problem in the declared host model.
    #[error("invalid model: {message}")]
    InvalidModel { message: String },

    /// A default-value or enum-value expression failed to evaluate at build time.
    #[error("expression error in '{site}': {source}")]
    Expression {
        site: String,
        source: crate::expr::ExprError,
    },
}

/// Classifies an execution-side error entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The query text could not be parsed.
    Syntax,
    /// Static validation against the schema rejected the document.
    Validation,
    /// The accumulated complexity score breached the configured limit.
    ComplexityLimitExceeded,
    /// A resolver failed; the error is scoped to one field, siblings continue.
    FieldResolution,
}

/// One step of the path from the operation root to a failing field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// A source position inside the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// An error attached to an execution result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEntry {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
}

impl ErrorEntry {
    /// A syntax error reported by the parser collaborator.
    pub fn syntax(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Syntax,
            message: message.into(),
            path: Vec::new(),
            locations: Vec::new(),
        }
    }

    /// A static validation error reported by the validator collaborator.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
            path: Vec::new(),
            locations: Vec::new(),
        }
    }

    /// A fatal complexity-limit breach.
    pub fn complexity_limit(current: f64, limit: f64) -> Self {
        Self {
            kind: ErrorKind::ComplexityLimitExceeded,
            message: format!(
                "query complexity limit exceeded: current [{current}], limit [{limit}]"
            ),
            path: Vec::new(),
            locations: Vec::new(),
        }
    }

    /// A recovered per-field resolver failure.
    pub fn field_resolution(
        resolver: &str,
        cause: &dyn std::fmt::Display,
        path: Vec<PathSegment>,
        locations: Vec<Location>,
    ) -> Self {
        Self {
            kind: ErrorKind::FieldResolution,
            message: format!("resolver '{resolver}' failed: {cause}"),
            path,
            locations,
        }
    }

    /// Attach a path to this entry, replacing any existing one.
    pub fn at_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }
}
