//! Declared host object model
//!
//! The Rust analogue of the original's annotated classes: a host application
//! declares its types as plain data descriptors carrying the same metadata the
//! annotations carried (exposed name, description, exposure opt-in/opt-out,
//! nullability, deprecation, cost expression, default-value handles), plus a
//! resolver callback per method-style member. Everything downstream (the
//! schema builder and the execution engine) operates only on these
//! descriptors, never on anything reflective.

use crate::locator::Service;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Identifies one host type inside the declared model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostTypeId(String);

impl HostTypeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HostTypeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for HostTypeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A resolver callback bound later to its service instance.
///
/// Arguments arrive positionally, already bound by the field resolution
/// binder. Immediate results are lifted into the same deferred shape as
/// asynchronous ones, so the engine composes both uniformly.
pub type MethodInvoker =
    Arc<dyn Fn(Service, Vec<Value>) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// Produces a default value for an argument or input field at build time.
pub type DefaultValueProvider = Arc<dyn Fn() -> Value + Send + Sync>;

/// Computes the internal value for one enum constant, given its identifier.
pub type EnumValueProvider = Arc<dyn Fn(&str) -> Value + Send + Sync>;

/// Wrap an async closure into a [`MethodInvoker`].
pub fn invoker<F, Fut>(f: F) -> MethodInvoker
where
    F: Fn(Service, Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(move |service, args| Box::pin(f(service, args)))
}

/// A type mention at a member or parameter site: the referenced host type plus
/// collection-ness and nullability of the site itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeUse {
    pub target: HostTypeId,
    pub is_list: bool,
    pub optional: bool,
}

impl TypeUse {
    /// A non-null, non-list mention of `target`.
    pub fn of(target: impl Into<HostTypeId>) -> Self {
        Self {
            target: target.into(),
            is_list: false,
            optional: false,
        }
    }

    /// A list of `target`.
    pub fn list_of(target: impl Into<HostTypeId>) -> Self {
        Self {
            target: target.into(),
            is_list: true,
            optional: false,
        }
    }

    /// Mark the site nullable.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Annotation-equivalent metadata on a member, parameter or enum constant.
///
/// Defaults are all-off: a member with default metadata is not exposed
/// (exposure is an explicit opt-in, mirroring the original's field marker).
#[derive(Clone, Default)]
pub struct MemberMeta {
    /// Explicit exposed name; overrides the member/parameter identifier.
    pub exposed_name: Option<String>,
    pub description: Option<String>,
    /// Explicit opt-in marker for members.
    pub expose: bool,
    /// Opt-out marker; suppresses exposure even when opted in.
    pub ignore: bool,
    /// Expose as the ID scalar.
    pub is_id: bool,
    pub deprecation_reason: Option<String>,
    /// Opaque cost formula; `childScore` and argument values are bound when
    /// the engine evaluates it.
    pub cost_expression: Option<String>,
    /// Marks a parameter as a visible input argument.
    pub is_input: bool,
    pub default_provider: Option<DefaultValueProvider>,
    pub default_expression: Option<String>,
    /// Marks the schema host type's root query field.
    pub is_schema_query: bool,
    /// Marks a method as a mutation.
    pub is_mutation: bool,
    /// Field name the mutation's return value is exposed under in its output
    /// wrapper.
    pub out_name: Option<String>,
}

impl fmt::Debug for MemberMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberMeta")
            .field("exposed_name", &self.exposed_name)
            .field("expose", &self.expose)
            .field("ignore", &self.ignore)
            .field("is_id", &self.is_id)
            .field("is_input", &self.is_input)
            .field("is_mutation", &self.is_mutation)
            .finish_non_exhaustive()
    }
}

impl MemberMeta {
    /// Metadata for an exposed member.
    pub fn exposed() -> Self {
        Self {
            expose: true,
            ..Default::default()
        }
    }

    /// Metadata for a visible input parameter named `name`.
    pub fn input(name: impl Into<String>) -> Self {
        Self {
            is_input: true,
            exposed_name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Metadata for a mutation method named `name`.
    pub fn mutation(name: impl Into<String>) -> Self {
        Self {
            is_mutation: true,
            exposed_name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.exposed_name = Some(name.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(mut self) -> Self {
        self.is_id = true;
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    pub fn cost(mut self, expression: impl Into<String>) -> Self {
        self.cost_expression = Some(expression.into());
        self
    }

    pub fn default_expression(mut self, expression: impl Into<String>) -> Self {
        self.default_expression = Some(expression.into());
        self
    }

    pub fn default_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default_provider = Some(Arc::new(provider));
        self
    }

    pub fn schema_query(mut self) -> Self {
        self.is_schema_query = true;
        self
    }

    pub fn out(mut self, name: impl Into<String>) -> Self {
        self.out_name = Some(name.into());
        self
    }
}

/// A formal parameter of a resolver method.
#[derive(Debug, Clone)]
pub struct RawParam {
    pub ident: String,
    pub param_type: TypeUse,
    pub meta: MemberMeta,
}

impl RawParam {
    /// A visible input parameter.
    pub fn input(name: impl Into<String>, param_type: TypeUse) -> Self {
        let name = name.into();
        Self {
            ident: name.clone(),
            param_type,
            meta: MemberMeta::input(name),
        }
    }

    /// A non-visible parameter bound by runtime type (context, source, ...).
    pub fn by_type(ident: impl Into<String>, param_type: TypeUse) -> Self {
        Self {
            ident: ident.into(),
            param_type,
            meta: MemberMeta::default(),
        }
    }

    pub fn with_meta(mut self, meta: MemberMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// The concrete site a member occupies on its host type.
#[derive(Clone)]
pub enum MemberSite {
    /// A plain data field, resolved by key lookup on the parent value.
    Property { value_type: TypeUse },
    /// A resolver method. `invoke` is `None` on interfaces, which declare the
    /// signature only.
    Method {
        return_type: TypeUse,
        params: Vec<RawParam>,
        invoke: Option<MethodInvoker>,
    },
}

impl fmt::Debug for MemberSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberSite::Property { value_type } => f
                .debug_struct("Property")
                .field("value_type", value_type)
                .finish(),
            MemberSite::Method {
                return_type,
                params,
                invoke,
            } => f
                .debug_struct("Method")
                .field("return_type", return_type)
                .field("params", &params.len())
                .field("has_invoker", &invoke.is_some())
                .finish(),
        }
    }
}

/// One declared member of a host type.
#[derive(Debug, Clone)]
pub struct RawMember {
    pub ident: String,
    pub meta: MemberMeta,
    pub site: MemberSite,
}

/// One constant of an enum host type.
#[derive(Debug, Clone)]
pub struct EnumConstant {
    pub ident: String,
    pub meta: MemberMeta,
}

impl EnumConstant {
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            meta: MemberMeta::default(),
        }
    }

    pub fn with_meta(mut self, meta: MemberMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// Shape-specific payload of a host type.
#[derive(Clone)]
pub enum HostShape {
    Object {
        members: Vec<RawMember>,
        /// Marker interfaces the concrete type implements.
        implements: Vec<HostTypeId>,
    },
    Interface {
        members: Vec<RawMember>,
        /// When present, the interface is exposed as a union of these types.
        union_of: Option<Vec<HostTypeId>>,
    },
    Enum {
        constants: Vec<EnumConstant>,
        /// Computes each constant's internal value; overrides the label.
        value_provider: Option<EnumValueProvider>,
        /// Expression refining the internal value; bound variables: `name`
        /// (the label) and `value` (the value so far).
        value_expression: Option<String>,
    },
}

impl fmt::Debug for HostShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostShape::Object { members, implements } => f
                .debug_struct("Object")
                .field("members", &members.len())
                .field("implements", implements)
                .finish(),
            HostShape::Interface { members, union_of } => f
                .debug_struct("Interface")
                .field("members", &members.len())
                .field("union_of", union_of)
                .finish(),
            HostShape::Enum { constants, .. } => f
                .debug_struct("Enum")
                .field("constants", &constants.len())
                .finish_non_exhaustive(),
        }
    }
}

/// One declared host type.
#[derive(Debug, Clone)]
pub struct HostType {
    pub id: HostTypeId,
    pub exposed_name: Option<String>,
    pub description: Option<String>,
    pub shape: HostShape,
}

impl HostType {
    pub fn object(id: impl Into<HostTypeId>) -> Self {
        Self {
            id: id.into(),
            exposed_name: None,
            description: None,
            shape: HostShape::Object {
                members: Vec::new(),
                implements: Vec::new(),
            },
        }
    }

    pub fn interface(id: impl Into<HostTypeId>) -> Self {
        Self {
            id: id.into(),
            exposed_name: None,
            description: None,
            shape: HostShape::Interface {
                members: Vec::new(),
                union_of: None,
            },
        }
    }

    pub fn union(id: impl Into<HostTypeId>, possible: Vec<HostTypeId>) -> Self {
        Self {
            id: id.into(),
            exposed_name: None,
            description: None,
            shape: HostShape::Interface {
                members: Vec::new(),
                union_of: Some(possible),
            },
        }
    }

    pub fn enumeration(id: impl Into<HostTypeId>, constants: Vec<EnumConstant>) -> Self {
        Self {
            id: id.into(),
            exposed_name: None,
            description: None,
            shape: HostShape::Enum {
                constants,
                value_provider: None,
                value_expression: None,
            },
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.exposed_name = Some(name.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare a property member.
    pub fn property(mut self, ident: impl Into<String>, value_type: TypeUse, meta: MemberMeta) -> Self {
        let member = RawMember {
            ident: ident.into(),
            meta,
            site: MemberSite::Property { value_type },
        };
        self.push_member(member);
        self
    }

    /// Declare a resolver method member.
    pub fn resolver(
        mut self,
        ident: impl Into<String>,
        return_type: TypeUse,
        params: Vec<RawParam>,
        invoke: MethodInvoker,
        meta: MemberMeta,
    ) -> Self {
        let member = RawMember {
            ident: ident.into(),
            meta,
            site: MemberSite::Method {
                return_type,
                params,
                invoke: Some(invoke),
            },
        };
        self.push_member(member);
        self
    }

    /// Declare a method signature without an invoker (interface members).
    pub fn method_signature(
        mut self,
        ident: impl Into<String>,
        return_type: TypeUse,
        params: Vec<RawParam>,
        meta: MemberMeta,
    ) -> Self {
        let member = RawMember {
            ident: ident.into(),
            meta,
            site: MemberSite::Method {
                return_type,
                params,
                invoke: None,
            },
        };
        self.push_member(member);
        self
    }

    /// Declare a marker interface on a concrete object type.
    pub fn implements(mut self, interface: impl Into<HostTypeId>) -> Self {
        if let HostShape::Object { implements, .. } = &mut self.shape {
            implements.push(interface.into());
        }
        self
    }

    /// Attach an enum value provider.
    pub fn enum_value_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn(&str) -> Value + Send + Sync + 'static,
    {
        if let HostShape::Enum { value_provider, .. } = &mut self.shape {
            *value_provider = Some(Arc::new(provider));
        }
        self
    }

    /// Attach an enum value override expression.
    pub fn enum_value_expression(mut self, expression: impl Into<String>) -> Self {
        if let HostShape::Enum {
            value_expression, ..
        } = &mut self.shape
        {
            *value_expression = Some(expression.into());
        }
        self
    }

    pub fn members(&self) -> &[RawMember] {
        match &self.shape {
            HostShape::Object { members, .. } | HostShape::Interface { members, .. } => members,
            HostShape::Enum { .. } => &[],
        }
    }

    fn push_member(&mut self, member: RawMember) {
        match &mut self.shape {
            HostShape::Object { members, .. } | HostShape::Interface { members, .. } => {
                members.push(member)
            }
            HostShape::Enum { .. } => {}
        }
    }
}

/// The complete declared model, keyed by host type id.
#[derive(Debug, Default, Clone)]
pub struct ModelRegistry {
    types: IndexMap<HostTypeId, HostType>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, host_type: HostType) -> Self {
        self.types.insert(host_type.id.clone(), host_type);
        self
    }

    pub fn get(&self, id: &HostTypeId) -> Option<&HostType> {
        self.types.get(id)
    }

    pub fn contains(&self, id: &HostTypeId) -> bool {
        self.types.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostType> {
        self.types.values()
    }
}
