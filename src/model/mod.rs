//! Host object model and metadata access

pub mod accessor;
pub mod host;

pub use host::{
    invoker, DefaultValueProvider, EnumConstant, EnumValueProvider, HostShape, HostType,
    HostTypeId, MemberMeta, MemberSite, MethodInvoker, ModelRegistry, RawMember, RawParam, TypeUse,
};
