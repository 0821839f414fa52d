//! Core shared types

pub mod error;

pub use error::{ErrorEntry, ErrorKind, Location, PathSegment, SchemaError};
