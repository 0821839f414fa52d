//! Type metadata accessor
//!
//! A single choke point that answers every metadata question the schema
//! builder asks about a declared member: is it eligible for exposure, what is
//! its exposed name, is it nullable, is it a list, what type does it point at.
//! Keeping the precedence rules here means the builder never reads
//! [`MemberMeta`] fields directly and every naming decision is made exactly
//! one way.

use super::host::{
    DefaultValueProvider, EnumConstant, HostType, HostTypeId, MemberMeta, MemberSite, RawMember,
    RawParam, TypeUse,
};

/// Exposure-relevant view of one member.
#[derive(Clone)]
pub struct MemberDescriptor {
    pub exposed_name: String,
    pub description: Option<String>,
    pub is_id: bool,
    pub nullable: bool,
    pub is_list: bool,
    pub element_type: HostTypeId,
    pub deprecation_reason: Option<String>,
    pub cost_expression: Option<String>,
    pub default_provider: Option<DefaultValueProvider>,
    pub default_expression: Option<String>,
}

/// Exposure-relevant view of one resolver parameter.
#[derive(Clone)]
pub struct ParamDescriptor {
    pub exposed_name: String,
    pub description: Option<String>,
    /// Visible parameters become schema arguments; the rest are bound by
    /// runtime type.
    pub visible: bool,
    pub required: bool,
    pub is_list: bool,
    pub element_type: HostTypeId,
    pub default_provider: Option<DefaultValueProvider>,
    pub default_expression: Option<String>,
}

/// Exposure-relevant view of one enum constant.
#[derive(Debug, Clone)]
pub struct EnumConstantDescriptor {
    pub label: String,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
}

/// Exposed name of a host type: the explicit name wins over the identifier.
pub fn type_name(host: &HostType) -> String {
    host.exposed_name
        .clone()
        .unwrap_or_else(|| host.id.as_str().to_string())
}

/// Whether a member participates in the schema as a field.
///
/// Exposure is opt-in (the exposure marker or the ID marker), the ignore
/// marker always wins, and mutation/root-query members are handled through
/// their own paths rather than as plain fields.
pub fn is_field_eligible(member: &RawMember) -> bool {
    let meta = &member.meta;
    !meta.ignore && (meta.expose || meta.is_id) && !meta.is_mutation && !meta.is_schema_query
}

/// Whether a member is a mutation entry point.
pub fn is_mutation(member: &RawMember) -> bool {
    !member.meta.ignore && member.meta.is_mutation
}

/// Whether a member is the schema host's root query field.
pub fn is_schema_query(member: &RawMember) -> bool {
    !member.meta.ignore && member.meta.is_schema_query
}

/// Describe a field-eligible or mutation member.
pub fn describe_member(member: &RawMember) -> MemberDescriptor {
    let value_type = member_type(member);
    MemberDescriptor {
        exposed_name: exposed_name(&member.meta, &member.ident),
        description: member.meta.description.clone(),
        is_id: member.meta.is_id,
        nullable: value_type.optional,
        is_list: value_type.is_list,
        element_type: value_type.target.clone(),
        deprecation_reason: member.meta.deprecation_reason.clone(),
        cost_expression: member.meta.cost_expression.clone(),
        default_provider: member.meta.default_provider.clone(),
        default_expression: member.meta.default_expression.clone(),
    }
}

/// Describe a resolver parameter.
pub fn describe_param(param: &RawParam) -> ParamDescriptor {
    ParamDescriptor {
        exposed_name: exposed_name(&param.meta, &param.ident),
        description: param.meta.description.clone(),
        visible: param.meta.is_input,
        required: !param.param_type.optional,
        is_list: param.param_type.is_list,
        element_type: param.param_type.target.clone(),
        default_provider: param.meta.default_provider.clone(),
        default_expression: param.meta.default_expression.clone(),
    }
}

/// Describe an enum constant.
pub fn describe_enum_constant(constant: &EnumConstant) -> EnumConstantDescriptor {
    EnumConstantDescriptor {
        label: exposed_name(&constant.meta, &constant.ident),
        description: constant.meta.description.clone(),
        deprecation_reason: constant.meta.deprecation_reason.clone(),
    }
}

/// The type a member's value carries: the property type, or a method's
/// return type.
pub fn member_type(member: &RawMember) -> &TypeUse {
    match &member.site {
        MemberSite::Property { value_type } => value_type,
        MemberSite::Method { return_type, .. } => return_type,
    }
}

fn exposed_name(meta: &MemberMeta, ident: &str) -> String {
    meta.exposed_name
        .clone()
        .unwrap_or_else(|| ident.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::host::HostType;

    fn member(ident: &str, meta: MemberMeta) -> RawMember {
        RawMember {
            ident: ident.to_string(),
            meta,
            site: MemberSite::Property {
                value_type: TypeUse::of("String"),
            },
        }
    }

    #[test]
    fn test_exposure_is_opt_in() {
        assert!(!is_field_eligible(&member("hidden", MemberMeta::default())));
        assert!(is_field_eligible(&member("shown", MemberMeta::exposed())));
        assert!(is_field_eligible(&member("id", MemberMeta::default().id())));
    }

    #[test]
    fn test_ignore_wins_over_exposure() {
        assert!(!is_field_eligible(&member(
            "hidden",
            MemberMeta::exposed().ignored()
        )));
        assert!(!is_field_eligible(&member(
            "hidden_id",
            MemberMeta::default().id().ignored()
        )));
    }

    #[test]
    fn test_mutations_are_not_plain_fields() {
        let meta = MemberMeta::mutation("createTodo");
        assert!(!is_field_eligible(&member("create_todo", meta.clone())));
        assert!(is_mutation(&member("create_todo", meta)));
    }

    #[test]
    fn test_explicit_name_wins_over_ident() {
        let described = describe_member(&member(
            "full_name",
            MemberMeta::exposed().named("displayName"),
        ));
        assert_eq!(described.exposed_name, "displayName");

        let described = describe_member(&member("email", MemberMeta::exposed()));
        assert_eq!(described.exposed_name, "email");
    }

    #[test]
    fn test_type_name_precedence() {
        let plain = HostType::object("user");
        assert_eq!(type_name(&plain), "user");
        let renamed = HostType::object("user").named("User");
        assert_eq!(type_name(&renamed), "User");
    }

    #[test]
    fn test_nullability_follows_optional_marker() {
        let required = RawMember {
            ident: "name".to_string(),
            meta: MemberMeta::exposed(),
            site: MemberSite::Property {
                value_type: TypeUse::of("String"),
            },
        };
        assert!(!describe_member(&required).nullable);

        let optional = RawMember {
            ident: "nickname".to_string(),
            meta: MemberMeta::exposed(),
            site: MemberSite::Property {
                value_type: TypeUse::of("String").optional(),
            },
        };
        assert!(describe_member(&optional).nullable);
    }

    #[test]
    fn test_param_visibility_and_defaults() {
        let visible = RawParam::input("first", TypeUse::of("i32").optional())
            .with_meta(MemberMeta::input("first").default_expression("1"));
        let described = describe_param(&visible);
        assert!(described.visible);
        assert!(!described.required);
        assert_eq!(described.default_expression.as_deref(), Some("1"));

        let context = RawParam::by_type("ctx", TypeUse::of("request_context"));
        assert!(!describe_param(&context).visible);
    }
}
