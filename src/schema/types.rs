//! Built type-graph descriptors
//!
//! The finished product of a schema build is a flat arena of
//! [`TypeDescriptor`]s keyed by exposed name. Nested type mentions are
//! [`TypeRef`] tokens rather than nested descriptors, which is what lets a
//! cyclic host model (`User.manager: User`) come out as a finite graph: a
//! mention of a type whose construction has already started is recorded as a
//! pending reference and rewritten to its resolved form in a finalize pass
//! once the whole walk is done.

use crate::locator::Service;
use crate::model::{HostTypeId, MethodInvoker};
use serde_json::Value;
use std::fmt;

/// Classification of a built type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

/// A mention of another type inside the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// The named type's construction had started but not finished when this
    /// mention was recorded. Rewritten during finalize.
    Pending(String),
    /// The named type is fully built.
    Resolved(String),
}

impl TypeRef {
    pub fn name(&self) -> &str {
        match self {
            TypeRef::Pending(name) | TypeRef::Resolved(name) => name,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TypeRef::Pending(_))
    }
}

/// The type of a field or argument site: target type plus site modifiers.
#[derive(Debug, Clone)]
pub struct FieldType {
    pub type_ref: TypeRef,
    pub nullable: bool,
    pub is_list: bool,
}

/// One constant of a built enum type.
#[derive(Debug, Clone)]
pub struct EnumValueDescriptor {
    pub label: String,
    /// Internal value produced when this constant is selected.
    pub value: Value,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
}

/// One visible argument of a field.
#[derive(Debug, Clone)]
pub struct ArgumentDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub argument_type: FieldType,
    pub required: bool,
    /// Resolved once at build time; provider output wins over expression
    /// output.
    pub default_value: Option<Value>,
}

/// How one formal parameter of a resolver is bound at invocation time.
#[derive(Debug, Clone)]
pub enum ParamBinding {
    /// Bound from the named-argument map, falling back to the build-time
    /// default.
    Input {
        name: String,
        default_value: Option<Value>,
    },
    /// Bound from the fallback list by host-type match (context, source).
    ByType,
}

/// Binding plan for one formal parameter, classified once at build time.
#[derive(Debug, Clone)]
pub struct ParamPlan {
    pub ident: String,
    pub target_type: HostTypeId,
    pub is_list: bool,
    pub binding: ParamBinding,
}

/// Everything needed to invoke a resolver method: the service instance it
/// runs against, the callback, and the positional binding plan.
#[derive(Clone)]
pub struct FieldInvoker {
    pub host_type: HostTypeId,
    pub field_name: String,
    pub instance: Service,
    pub invoke: MethodInvoker,
    pub params: Vec<ParamPlan>,
}

impl fmt::Debug for FieldInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInvoker")
            .field("host_type", &self.host_type)
            .field("field_name", &self.field_name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl FieldInvoker {
    /// Identity string used in resolver failure reports.
    pub fn identity(&self) -> String {
        format!("{}.{}", self.host_type, self.field_name)
    }
}

/// How a field's value is obtained at execution time.
#[derive(Debug, Clone)]
pub enum FieldSource {
    /// Key lookup on the parent value.
    Property { member_name: String },
    /// Resolver method invocation.
    Method(FieldInvoker),
}

/// One field of a built object, interface or input type.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub field_type: FieldType,
    pub deprecation_reason: Option<String>,
    pub arguments: Vec<ArgumentDescriptor>,
    pub cost_expression: Option<String>,
    /// Build-time default, carried by input-object fields only.
    pub default_value: Option<Value>,
    pub source: FieldSource,
}

impl FieldDescriptor {
    pub fn argument(&self, name: &str) -> Option<&ArgumentDescriptor> {
        self.arguments.iter().find(|a| a.name == name)
    }
}

/// One built type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub name: String,
    pub kind: TypeKind,
    pub description: Option<String>,
    pub fields: Vec<FieldDescriptor>,
    /// Interfaces implemented by an object type.
    pub interfaces: Vec<TypeRef>,
    /// Possible concrete types of a union.
    pub possible_types: Vec<TypeRef>,
    pub enum_values: Vec<EnumValueDescriptor>,
    /// The host type this descriptor was built from; absent for synthetic
    /// types (scalars, wrappers, the mutation root).
    pub host_type: Option<HostTypeId>,
}

impl TypeDescriptor {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Scalar,
            description: None,
            fields: Vec::new(),
            interfaces: Vec::new(),
            possible_types: Vec::new(),
            enum_values: Vec::new(),
            host_type: None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One registered mutation with its wrapper types.
#[derive(Debug, Clone)]
pub struct MutationDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub input_type_name: String,
    pub output_type_name: String,
    /// Field of the output wrapper carrying the declared return value.
    pub output_field_name: String,
    pub cost_expression: Option<String>,
    pub invoker: FieldInvoker,
}
