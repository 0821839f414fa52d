//! Query execution

pub mod binder;
mod engine;
pub mod executor;
pub mod result;
pub mod strategy;

pub use binder::bind_parameters;
pub use executor::{NoopValidator, QueryExecutor, QueryValidator};
pub use result::ExecutionResult;
pub use strategy::ExecutionStrategy;
