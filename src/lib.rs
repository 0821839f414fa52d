//! # graphforge
//!
//! Turns a declared host object model into a strongly-typed, cycle-safe
//! GraphQL type graph and executes queries against it with bounded depth,
//! bounded complexity, and configurable concurrency.
//!
//! ## Features
//!
//! - **Descriptor-driven schema building**: host applications declare plain
//!   data descriptors for their types and resolvers; the builder walks them
//!   depth-first into a deduplicated, reference-safe type graph
//! - **Cycle safety**: recursive models (`User.manager: User`) build into a
//!   finite graph through name references resolved in a finalize pass
//! - **Mutation wrappers**: each mutation gets deterministic input and output
//!   wrapper types carrying a client-correlation id alongside the payload
//! - **Bounded execution**: soft depth limiting, hard complexity limiting via
//!   per-field cost expressions, and sequential or bounded-parallel field
//!   resolution with guaranteed request-order results
//! - **Partial results**: resolver failures become per-field errors; sibling
//!   branches still populate data
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use graphforge::prelude::*;
//!
//! let model = ModelRegistry::new()
//!     .register(
//!         HostType::object("schema").resolver(
//!             "viewer",
//!             TypeUse::of("user"),
//!             vec![],
//!             invoker(|service, _args| async move { /* ... */ }),
//!             MemberMeta::exposed().schema_query(),
//!         ),
//!     )
//!     .register(
//!         HostType::object("user")
//!             .named("User")
//!             .property("id", TypeUse::of("String"), MemberMeta::default().id()),
//!     );
//!
//! let locator = InMemoryLocator::new().register("schema", MyService::default());
//! let schema = SchemaBuilder::new(model, SchemaConfig::default(), Arc::new(locator))
//!     .build("schema")?;
//!
//! let result = QueryExecutor::create(&schema)
//!     .query("{ viewer { id } }")
//!     .max_depth(10)
//!     .execute()
//!     .await;
//! ```

pub mod config;
pub mod core;
pub mod execute;
pub mod expr;
pub mod locator;
pub mod model;
pub mod schema;
pub mod template;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Model declaration ===
    pub use crate::model::{
        invoker, EnumConstant, HostShape, HostType, HostTypeId, MemberMeta, ModelRegistry,
        RawParam, TypeUse,
    };

    // === Schema building ===
    pub use crate::config::SchemaConfig;
    pub use crate::schema::{ScalarMapping, ScalarResolver, SchemaBuilder, SchemaIndex, TypeKind};

    // === Execution ===
    pub use crate::execute::{
        ExecutionResult, ExecutionStrategy, NoopValidator, QueryExecutor, QueryValidator,
    };

    // === Collaborators ===
    pub use crate::expr::{ExpressionEvaluator, SimpleEvaluator};
    pub use crate::locator::{InMemoryLocator, Service, ServiceLocator};
    pub use crate::template::{MutationQuery, MutationQueryTemplate};

    // === Errors ===
    pub use crate::core::{ErrorEntry, ErrorKind, SchemaError};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{json, Value};
    pub use std::sync::Arc;
    pub use uuid::Uuid;
}
