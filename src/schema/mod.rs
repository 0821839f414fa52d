//! Schema graph construction

pub mod builder;
pub mod index;
pub mod scalars;
pub mod types;

pub use builder::SchemaBuilder;
pub use index::SchemaIndex;
pub use scalars::{Coercion, ScalarMapping, ScalarResolver, ScalarTable};
pub use types::{
    ArgumentDescriptor, EnumValueDescriptor, FieldDescriptor, FieldInvoker, FieldSource,
    FieldType, MutationDescriptor, ParamBinding, ParamPlan, TypeDescriptor, TypeKind, TypeRef,
};
