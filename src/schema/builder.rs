//! Schema graph builder
//!
//! A depth-first walk over the declared host model that produces the
//! [`SchemaIndex`]. The walk is cycle-safe: a host type's name is registered
//! *before* its members are recursed into, and any mention of a type whose
//! visitation has already started comes back as a pending reference instead
//! of a second descriptor. A finalize pass rewrites every pending reference
//! once the whole graph exists, so the finished index contains exactly one
//! descriptor per admitted type.

use crate::config::SchemaConfig;
use crate::core::SchemaError;
use crate::expr::{ExpressionEvaluator, SimpleEvaluator};
use crate::locator::ServiceLocator;
use crate::model::{
    accessor, HostShape, HostType, HostTypeId, MemberSite, ModelRegistry, RawMember,
};
use crate::schema::index::SchemaIndex;
use crate::schema::scalars::{Coercion, ScalarMapping, ScalarResolver, ScalarTable};
use crate::schema::types::{
    ArgumentDescriptor, EnumValueDescriptor, FieldDescriptor, FieldInvoker, FieldSource,
    FieldType, MutationDescriptor, ParamBinding, ParamPlan, TypeDescriptor, TypeKind, TypeRef,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Builds a [`SchemaIndex`] from a declared model.
pub struct SchemaBuilder {
    model: ModelRegistry,
    config: SchemaConfig,
    locator: Arc<dyn ServiceLocator>,
    evaluator: Arc<dyn ExpressionEvaluator>,
    scalars: ScalarTable,

    // traversal state
    visitation_started: HashSet<HostTypeId>,
    input_visitation: HashSet<HostTypeId>,
    name_by_host: HashMap<HostTypeId, String>,
    input_name_by_host: HashMap<HostTypeId, String>,
    /// Exposed name → owner description, for duplicate-name detection.
    name_owner: HashMap<String, String>,
    types: IndexMap<String, TypeDescriptor>,
    object_type_by_host: HashMap<HostTypeId, String>,
    mutations: IndexMap<String, MutationDescriptor>,
    mutation_input_field_by_host: HashMap<(String, HostTypeId), String>,
    mutation_output_type_by_host: HashMap<(String, HostTypeId), String>,
    scalar_coercions: HashMap<String, Coercion>,
}

impl SchemaBuilder {
    pub fn new(
        model: ModelRegistry,
        config: SchemaConfig,
        locator: Arc<dyn ServiceLocator>,
    ) -> Self {
        let scalars = ScalarTable::new(&config);
        Self {
            model,
            config,
            locator,
            evaluator: Arc::new(SimpleEvaluator),
            scalars,
            visitation_started: HashSet::new(),
            input_visitation: HashSet::new(),
            name_by_host: HashMap::new(),
            input_name_by_host: HashMap::new(),
            name_owner: HashMap::new(),
            types: IndexMap::new(),
            object_type_by_host: HashMap::new(),
            mutations: IndexMap::new(),
            mutation_input_field_by_host: HashMap::new(),
            mutation_output_type_by_host: HashMap::new(),
            scalar_coercions: HashMap::new(),
        }
    }

    /// Replace the built-in expression evaluator.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Append a scalar resolver to the resolution chain.
    pub fn with_scalar_resolver(mut self, resolver: Arc<dyn ScalarResolver>) -> Self {
        self.scalars.register(resolver);
        self
    }

    /// Build the schema graph rooted at the schema host type.
    ///
    /// Fails if the schema host declares no root query field, and on every
    /// structural model error (duplicate names, unknown references, missing
    /// resolver services).
    pub fn build(mut self, schema_host: impl Into<HostTypeId>) -> Result<SchemaIndex, SchemaError> {
        let schema_id = schema_host.into();
        let schema = self
            .model
            .get(&schema_id)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownHostType {
                id: schema_id.to_string(),
                referenced_from: "schema root".to_string(),
            })?;

        let query_member = schema
            .members()
            .iter()
            .find(|m| accessor::is_schema_query(m))
            .cloned()
            .ok_or(SchemaError::MissingRootQuery)?;
        let query_target = accessor::member_type(&query_member).target.clone();
        let query_site = format!("{}.{}", schema.id, query_member.ident);
        let query_ref = self.build_output_type(&query_target, &query_site)?;
        let query_type = query_ref.name().to_string();

        let mutation_members: Vec<RawMember> = schema
            .members()
            .iter()
            .filter(|m| accessor::is_mutation(m))
            .cloned()
            .collect();
        for member in &mutation_members {
            self.build_mutation(&schema, member)?;
        }
        let mutation_type = if self.mutations.is_empty() {
            None
        } else {
            Some(self.build_mutation_root()?)
        };

        self.finalize()?;

        info!(
            types = self.types.len(),
            mutations = self.mutations.len(),
            query_type = %query_type,
            "schema graph built"
        );

        Ok(SchemaIndex {
            types: self
                .types
                .into_iter()
                .map(|(name, descriptor)| (name, Arc::new(descriptor)))
                .collect(),
            query_type,
            mutation_type,
            object_type_by_host: self.object_type_by_host,
            mutations: self.mutations,
            mutation_input_field_by_host: self.mutation_input_field_by_host,
            mutation_output_type_by_host: self.mutation_output_type_by_host,
            scalar_coercions: self.scalar_coercions,
            config: self.config,
            evaluator: self.evaluator,
        })
    }

    /// Build (or reference) the output type for a host type mention.
    fn build_output_type(
        &mut self,
        target: &HostTypeId,
        site: &str,
    ) -> Result<TypeRef, SchemaError> {
        if let Some(mapping) = self.scalars.resolve(target) {
            return self.admit_scalar(mapping);
        }

        let host = self
            .model
            .get(target)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownHostType {
                id: target.to_string(),
                referenced_from: site.to_string(),
            })?;

        // cycle breaker: checked before recursing into members, not after
        if self.visitation_started.contains(target) {
            let name = self.name_by_host[target].clone();
            return Ok(if self.types.contains_key(&name) {
                TypeRef::Resolved(name)
            } else {
                TypeRef::Pending(name)
            });
        }

        let name = accessor::type_name(&host);
        self.claim_name(&name, format!("host type '{}'", target))?;
        self.visitation_started.insert(target.clone());
        self.name_by_host.insert(target.clone(), name.clone());

        let descriptor = match &host.shape {
            HostShape::Enum {
                constants,
                value_provider,
                value_expression,
            } => {
                let mut enum_values = Vec::with_capacity(constants.len());
                for constant in constants {
                    let described = accessor::describe_enum_constant(constant);
                    let value = if let Some(provider) = value_provider {
                        provider(&described.label)
                    } else if let Some(expression) = value_expression {
                        let mut bindings = HashMap::new();
                        bindings.insert("name".to_string(), Value::String(described.label.clone()));
                        bindings.insert("value".to_string(), Value::String(described.label.clone()));
                        self.evaluator.evaluate(expression, &bindings).map_err(|source| {
                            SchemaError::Expression {
                                site: format!("{}.{}", name, described.label),
                                source,
                            }
                        })?
                    } else {
                        Value::String(described.label.clone())
                    };
                    enum_values.push(EnumValueDescriptor {
                        label: described.label,
                        value,
                        description: described.description,
                        deprecation_reason: described.deprecation_reason,
                    });
                }
                TypeDescriptor {
                    name: name.clone(),
                    kind: TypeKind::Enum,
                    description: host.description.clone(),
                    fields: Vec::new(),
                    interfaces: Vec::new(),
                    possible_types: Vec::new(),
                    enum_values,
                    host_type: Some(target.clone()),
                }
            }
            HostShape::Interface {
                union_of: Some(possible),
                ..
            } => {
                let mut possible_types = Vec::with_capacity(possible.len());
                for member_type in possible {
                    let member_site = format!("{name} possible type");
                    possible_types.push(self.build_output_type(member_type, &member_site)?);
                }
                TypeDescriptor {
                    name: name.clone(),
                    kind: TypeKind::Union,
                    description: host.description.clone(),
                    fields: Vec::new(),
                    interfaces: Vec::new(),
                    possible_types,
                    enum_values: Vec::new(),
                    host_type: Some(target.clone()),
                }
            }
            HostShape::Interface {
                members,
                union_of: None,
            } => {
                let mut fields = Vec::new();
                for member in members.clone() {
                    if accessor::is_field_eligible(&member) {
                        fields.push(self.build_field(&host, &member)?);
                    }
                }
                TypeDescriptor {
                    name: name.clone(),
                    kind: TypeKind::Interface,
                    description: host.description.clone(),
                    fields,
                    interfaces: Vec::new(),
                    possible_types: Vec::new(),
                    enum_values: Vec::new(),
                    host_type: Some(target.clone()),
                }
            }
            HostShape::Object {
                members,
                implements,
            } => {
                let mut fields = Vec::new();
                for member in members.clone() {
                    if accessor::is_field_eligible(&member) {
                        fields.push(self.build_field(&host, &member)?);
                    }
                }
                let mut interfaces = Vec::with_capacity(implements.len());
                for interface in implements.clone() {
                    let interface_site = format!("{name} implements");
                    interfaces.push(self.build_output_type(&interface, &interface_site)?);
                }
                self.object_type_by_host.insert(target.clone(), name.clone());
                TypeDescriptor {
                    name: name.clone(),
                    kind: TypeKind::Object,
                    description: host.description.clone(),
                    fields,
                    interfaces,
                    possible_types: Vec::new(),
                    enum_values: Vec::new(),
                    host_type: Some(target.clone()),
                }
            }
        };

        debug!(type_name = %name, kind = ?descriptor.kind, "registered type");
        self.types.insert(name.clone(), descriptor);
        Ok(TypeRef::Resolved(name))
    }

    /// Build one field of an object or interface type.
    fn build_field(
        &mut self,
        host: &HostType,
        member: &RawMember,
    ) -> Result<FieldDescriptor, SchemaError> {
        let described = accessor::describe_member(member);
        let site = format!("{}.{}", host.id, member.ident);

        let type_ref = if described.is_id {
            self.admit_scalar(ScalarMapping::passthrough("ID"))?
        } else {
            self.build_output_type(&described.element_type, &site)?
        };
        let field_type = FieldType {
            type_ref,
            nullable: described.nullable,
            is_list: described.is_list,
        };

        let (arguments, source) = match &member.site {
            MemberSite::Property { .. } => (
                Vec::new(),
                FieldSource::Property {
                    member_name: member.ident.clone(),
                },
            ),
            MemberSite::Method { params, invoke, .. } => {
                let mut arguments = Vec::new();
                let mut plans = Vec::with_capacity(params.len());
                for param in params {
                    let described_param = accessor::describe_param(param);
                    if described_param.visible {
                        let param_site = format!("{site}({})", described_param.exposed_name);
                        let argument_type_ref =
                            self.build_input_type(&described_param.element_type, &param_site)?;
                        let default_value = self.resolve_default(
                            &described_param.default_provider,
                            &described_param.default_expression,
                            &param_site,
                        )?;
                        arguments.push(ArgumentDescriptor {
                            name: described_param.exposed_name.clone(),
                            description: described_param.description.clone(),
                            argument_type: FieldType {
                                type_ref: argument_type_ref,
                                nullable: !described_param.required,
                                is_list: described_param.is_list,
                            },
                            required: described_param.required,
                            default_value: default_value.clone(),
                        });
                        plans.push(ParamPlan {
                            ident: param.ident.clone(),
                            target_type: described_param.element_type.clone(),
                            is_list: described_param.is_list,
                            binding: ParamBinding::Input {
                                name: described_param.exposed_name,
                                default_value,
                            },
                        });
                    } else {
                        plans.push(ParamPlan {
                            ident: param.ident.clone(),
                            target_type: described_param.element_type.clone(),
                            is_list: described_param.is_list,
                            binding: ParamBinding::ByType,
                        });
                    }
                }
                let source = match invoke {
                    Some(invoke) => {
                        let instance = self.locator.resolve_by_type(&host.id).ok_or_else(|| {
                            SchemaError::MissingResolverService {
                                host_type: host.id.to_string(),
                                field: described.exposed_name.clone(),
                            }
                        })?;
                        FieldSource::Method(FieldInvoker {
                            host_type: host.id.clone(),
                            field_name: described.exposed_name.clone(),
                            instance,
                            invoke: invoke.clone(),
                            params: plans,
                        })
                    }
                    // interface signatures carry no invoker; concrete
                    // dispatch happens on the implementor's own field
                    None => FieldSource::Property {
                        member_name: member.ident.clone(),
                    },
                };
                (arguments, source)
            }
        };

        Ok(FieldDescriptor {
            name: described.exposed_name,
            description: described.description,
            field_type,
            deprecation_reason: described.deprecation_reason,
            arguments,
            cost_expression: described.cost_expression,
            default_value: None,
            source,
        })
    }

    /// Build (or reference) the input-side type for a host type mention.
    ///
    /// Scalars and enums are shared with the output side; objects get their
    /// own InputObject descriptor built from eligible property members.
    fn build_input_type(
        &mut self,
        target: &HostTypeId,
        site: &str,
    ) -> Result<TypeRef, SchemaError> {
        if let Some(mapping) = self.scalars.resolve(target) {
            return self.admit_scalar(mapping);
        }

        let host = self
            .model
            .get(target)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownHostType {
                id: target.to_string(),
                referenced_from: site.to_string(),
            })?;

        match &host.shape {
            HostShape::Enum { .. } => self.build_output_type(target, site),
            HostShape::Interface { .. } => Err(SchemaError::InvalidModel {
                message: format!("interface host type '{target}' cannot be used as an input at '{site}'"),
            }),
            HostShape::Object { members, .. } => {
                if self.input_visitation.contains(target) {
                    let name = self.input_name_by_host[target].clone();
                    return Ok(if self.types.contains_key(&name) {
                        TypeRef::Resolved(name)
                    } else {
                        TypeRef::Pending(name)
                    });
                }

                let base = accessor::type_name(&host);
                let suffix = &self.config.input_object_name_suffix;
                let name = if base.ends_with(suffix.as_str()) {
                    base
                } else {
                    format!("{base}{suffix}")
                };
                self.claim_name(&name, format!("input type for host '{}'", target))?;
                self.input_visitation.insert(target.clone());
                self.input_name_by_host.insert(target.clone(), name.clone());

                let mut fields = Vec::new();
                for member in members.clone() {
                    if !accessor::is_field_eligible(&member) {
                        continue;
                    }
                    let described = accessor::describe_member(&member);
                    let member_site = format!("{}.{}", host.id, member.ident);
                    let type_ref = if described.is_id {
                        self.admit_scalar(ScalarMapping::passthrough("ID"))?
                    } else {
                        self.build_input_type(&described.element_type, &member_site)?
                    };
                    let default_value = self.resolve_default(
                        &described.default_provider,
                        &described.default_expression,
                        &member_site,
                    )?;
                    fields.push(FieldDescriptor {
                        name: described.exposed_name,
                        description: described.description,
                        field_type: FieldType {
                            type_ref,
                            nullable: described.nullable,
                            is_list: described.is_list,
                        },
                        deprecation_reason: described.deprecation_reason,
                        arguments: Vec::new(),
                        cost_expression: None,
                        default_value,
                        source: FieldSource::Property {
                            member_name: member.ident.clone(),
                        },
                    });
                }

                let descriptor = TypeDescriptor {
                    name: name.clone(),
                    kind: TypeKind::InputObject,
                    description: host.description.clone(),
                    fields,
                    interfaces: Vec::new(),
                    possible_types: Vec::new(),
                    enum_values: Vec::new(),
                    host_type: Some(target.clone()),
                };
                debug!(type_name = %name, "registered input type");
                self.types.insert(name.clone(), descriptor);
                Ok(TypeRef::Resolved(name))
            }
        }
    }

    /// Build one mutation: output wrapper, input wrapper, binding indices
    /// and the descriptor itself.
    fn build_mutation(
        &mut self,
        schema: &HostType,
        member: &RawMember,
    ) -> Result<(), SchemaError> {
        let described = accessor::describe_member(member);
        let name = described.exposed_name.clone();
        if self.mutations.contains_key(&name) {
            return Err(SchemaError::InvalidModel {
                message: format!("mutation '{name}' is declared twice"),
            });
        }

        let (return_type, params, invoke) = match &member.site {
            MemberSite::Method {
                return_type,
                params,
                invoke: Some(invoke),
            } => (return_type.clone(), params.clone(), invoke.clone()),
            _ => {
                return Err(SchemaError::InvalidModel {
                    message: format!("mutation '{name}' must be a resolver method"),
                })
            }
        };

        let output_name = format!("{name}{}", self.config.output_object_name_suffix);
        let input_name = format!("{name}{}", self.config.input_object_name_suffix);
        for wrapper in [&output_name, &input_name] {
            if self.name_owner.contains_key(wrapper.as_str()) {
                return Err(SchemaError::WrapperNameCollision {
                    mutation: name.clone(),
                    name: wrapper.clone(),
                });
            }
        }
        self.claim_name(&output_name, format!("mutation '{name}' output wrapper"))?;
        self.claim_name(&input_name, format!("mutation '{name}' input wrapper"))?;

        // output wrapper: echoed correlation id + the declared return field
        let site = format!("{}.{}", schema.id, member.ident);
        let output_field_name = member
            .meta
            .out_name
            .clone()
            .unwrap_or_else(|| "result".to_string());
        let return_ref = self.build_output_type(&return_type.target, &site)?;
        let output_descriptor = TypeDescriptor {
            name: output_name.clone(),
            kind: TypeKind::Object,
            description: None,
            fields: vec![
                self.client_mutation_id_field()?,
                FieldDescriptor {
                    name: output_field_name.clone(),
                    description: None,
                    field_type: FieldType {
                        type_ref: return_ref,
                        nullable: return_type.optional,
                        is_list: return_type.is_list,
                    },
                    deprecation_reason: None,
                    arguments: Vec::new(),
                    cost_expression: None,
                    default_value: None,
                    source: FieldSource::Property {
                        member_name: output_field_name.clone(),
                    },
                },
            ],
            interfaces: Vec::new(),
            possible_types: Vec::new(),
            enum_values: Vec::new(),
            host_type: None,
        };
        self.types.insert(output_name.clone(), output_descriptor);
        if self.model.contains(&return_type.target) {
            self.mutation_output_type_by_host
                .insert((name.clone(), return_type.target.clone()), output_name.clone());
        }

        // input wrapper: correlation id + one field per visible parameter
        let mut input_fields = vec![self.client_mutation_id_field()?];
        let mut plans = Vec::with_capacity(params.len());
        for param in &params {
            let described_param = accessor::describe_param(param);
            if described_param.visible {
                let param_site = format!("{site}({})", described_param.exposed_name);
                let type_ref = self.build_input_type(&described_param.element_type, &param_site)?;
                let default_value = self.resolve_default(
                    &described_param.default_provider,
                    &described_param.default_expression,
                    &param_site,
                )?;
                input_fields.push(FieldDescriptor {
                    name: described_param.exposed_name.clone(),
                    description: described_param.description.clone(),
                    field_type: FieldType {
                        type_ref,
                        nullable: !described_param.required,
                        is_list: described_param.is_list,
                    },
                    deprecation_reason: None,
                    arguments: Vec::new(),
                    cost_expression: None,
                    default_value: default_value.clone(),
                    source: FieldSource::Property {
                        member_name: param.ident.clone(),
                    },
                });
                if self.model.contains(&described_param.element_type) {
                    self.mutation_input_field_by_host.insert(
                        (name.clone(), described_param.element_type.clone()),
                        described_param.exposed_name.clone(),
                    );
                }
                plans.push(ParamPlan {
                    ident: param.ident.clone(),
                    target_type: described_param.element_type.clone(),
                    is_list: described_param.is_list,
                    binding: ParamBinding::Input {
                        name: described_param.exposed_name,
                        default_value,
                    },
                });
            } else {
                plans.push(ParamPlan {
                    ident: param.ident.clone(),
                    target_type: described_param.element_type.clone(),
                    is_list: described_param.is_list,
                    binding: ParamBinding::ByType,
                });
            }
        }
        let input_descriptor = TypeDescriptor {
            name: input_name.clone(),
            kind: TypeKind::InputObject,
            description: None,
            fields: input_fields,
            interfaces: Vec::new(),
            possible_types: Vec::new(),
            enum_values: Vec::new(),
            host_type: None,
        };
        self.types.insert(input_name.clone(), input_descriptor);

        let instance = self.locator.resolve_by_type(&schema.id).ok_or_else(|| {
            SchemaError::MissingResolverService {
                host_type: schema.id.to_string(),
                field: name.clone(),
            }
        })?;
        let descriptor = MutationDescriptor {
            name: name.clone(),
            description: described.description,
            deprecation_reason: described.deprecation_reason,
            input_type_name: input_name,
            output_type_name: output_name,
            output_field_name,
            cost_expression: described.cost_expression,
            invoker: FieldInvoker {
                host_type: schema.id.clone(),
                field_name: name.clone(),
                instance,
                invoke,
                params: plans,
            },
        };
        debug!(mutation = %name, "registered mutation");
        self.mutations.insert(name, descriptor);
        Ok(())
    }

    /// Synthesize the mutation root object type over all registered mutations.
    fn build_mutation_root(&mut self) -> Result<String, SchemaError> {
        let root_name = self.config.schema_mutation_object_name.clone();
        self.claim_name(&root_name, "mutation root".to_string())?;
        let argument_name = self.config.mutation_input_argument_name.clone();
        let fields = self
            .mutations
            .values()
            .map(|m| FieldDescriptor {
                name: m.name.clone(),
                description: m.description.clone(),
                field_type: FieldType {
                    type_ref: TypeRef::Resolved(m.output_type_name.clone()),
                    nullable: true,
                    is_list: false,
                },
                deprecation_reason: m.deprecation_reason.clone(),
                arguments: vec![ArgumentDescriptor {
                    name: argument_name.clone(),
                    description: None,
                    argument_type: FieldType {
                        type_ref: TypeRef::Resolved(m.input_type_name.clone()),
                        nullable: false,
                        is_list: false,
                    },
                    required: true,
                    default_value: None,
                }],
                cost_expression: m.cost_expression.clone(),
                default_value: None,
                // invocation goes through the mutation descriptor, not this field
                source: FieldSource::Property {
                    member_name: m.name.clone(),
                },
            })
            .collect();
        let descriptor = TypeDescriptor {
            name: root_name.clone(),
            kind: TypeKind::Object,
            description: None,
            fields,
            interfaces: Vec::new(),
            possible_types: Vec::new(),
            enum_values: Vec::new(),
            host_type: None,
        };
        self.types.insert(root_name.clone(), descriptor);
        Ok(root_name)
    }

    /// The synthetic client-correlation-id field shared by both wrappers.
    fn client_mutation_id_field(&mut self) -> Result<FieldDescriptor, SchemaError> {
        let type_ref = self.admit_scalar(ScalarMapping::passthrough("String"))?;
        let name = self.config.client_mutation_id_name.clone();
        Ok(FieldDescriptor {
            name: name.clone(),
            description: None,
            field_type: FieldType {
                type_ref,
                nullable: self.config.allow_empty_client_mutation_id,
                is_list: false,
            },
            deprecation_reason: None,
            arguments: Vec::new(),
            cost_expression: None,
            default_value: None,
            source: FieldSource::Property { member_name: name },
        })
    }

    /// Resolve an argument or input-field default once, at build time.
    /// Provider output wins over expression output.
    fn resolve_default(
        &self,
        provider: &Option<crate::model::DefaultValueProvider>,
        expression: &Option<String>,
        site: &str,
    ) -> Result<Option<Value>, SchemaError> {
        if let Some(provider) = provider {
            return Ok(Some(provider()));
        }
        if let Some(expression) = expression {
            let value = self
                .evaluator
                .evaluate(expression, &HashMap::new())
                .map_err(|source| SchemaError::Expression {
                    site: site.to_string(),
                    source,
                })?;
            return Ok(Some(value));
        }
        Ok(None)
    }

    fn admit_scalar(&mut self, mapping: ScalarMapping) -> Result<TypeRef, SchemaError> {
        if !self.types.contains_key(&mapping.name) {
            self.claim_name(&mapping.name, "scalar".to_string())?;
            self.scalar_coercions
                .insert(mapping.name.clone(), mapping.coercion);
            self.types
                .insert(mapping.name.clone(), TypeDescriptor::scalar(mapping.name.clone()));
        }
        Ok(TypeRef::Resolved(mapping.name))
    }

    fn claim_name(&mut self, name: &str, owner: String) -> Result<(), SchemaError> {
        match self.name_owner.get(name) {
            None => {
                self.name_owner.insert(name.to_string(), owner);
                Ok(())
            }
            Some(existing) if *existing == owner => Ok(()),
            Some(existing) => Err(SchemaError::DuplicateTypeName {
                name: name.to_string(),
                first: existing.clone(),
                second: owner,
            }),
        }
    }

    /// Rewrite every pending reference to its resolved form. Anything still
    /// unresolvable at this point is a model defect.
    fn finalize(&mut self) -> Result<(), SchemaError> {
        let known: HashSet<String> = self.types.keys().cloned().collect();
        let resolve = |type_ref: &mut TypeRef| -> Result<(), SchemaError> {
            if let TypeRef::Pending(name) = type_ref {
                if known.contains(name.as_str()) {
                    *type_ref = TypeRef::Resolved(std::mem::take(name));
                } else {
                    return Err(SchemaError::DanglingReference { name: name.clone() });
                }
            }
            Ok(())
        };
        for descriptor in self.types.values_mut() {
            for interface in &mut descriptor.interfaces {
                resolve(interface)?;
            }
            for possible in &mut descriptor.possible_types {
                resolve(possible)?;
            }
            for field in &mut descriptor.fields {
                resolve(&mut field.field_type.type_ref)?;
                for argument in &mut field.arguments {
                    resolve(&mut argument.argument_type.type_ref)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::InMemoryLocator;
    use crate::model::{EnumConstant, MemberMeta, TypeUse};
    use serde_json::json;

    struct NoService;

    fn builder_for(model: ModelRegistry) -> SchemaBuilder {
        SchemaBuilder::new(
            model,
            SchemaConfig::default(),
            Arc::new(InMemoryLocator::new().register("schema", NoService)),
        )
    }

    fn schema_with_query_target(target: &str) -> HostType {
        HostType::object("schema").property(
            "query",
            TypeUse::of(target),
            MemberMeta::exposed().schema_query(),
        )
    }

    #[test]
    fn test_missing_root_query_is_fatal() {
        let model = ModelRegistry::new().register(HostType::object("schema"));
        let err = builder_for(model).build("schema").expect_err("should fail");
        assert!(matches!(err, SchemaError::MissingRootQuery));
    }

    #[test]
    fn test_duplicate_exposed_name_is_fatal() {
        let model = ModelRegistry::new()
            .register(schema_with_query_target("root"))
            .register(
                HostType::object("root")
                    .named("Root")
                    .property("a", TypeUse::of("user_v1"), MemberMeta::exposed())
                    .property("b", TypeUse::of("user_v2"), MemberMeta::exposed()),
            )
            .register(HostType::object("user_v1").named("User").property(
                "id",
                TypeUse::of("String"),
                MemberMeta::default().id(),
            ))
            .register(HostType::object("user_v2").named("User").property(
                "id",
                TypeUse::of("String"),
                MemberMeta::default().id(),
            ));
        let err = builder_for(model).build("schema").expect_err("should fail");
        assert!(
            matches!(err, SchemaError::DuplicateTypeName { ref name, .. } if name == "User"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_self_referential_type_builds_once() {
        let model = ModelRegistry::new()
            .register(schema_with_query_target("user"))
            .register(
                HostType::object("user")
                    .named("User")
                    .property("id", TypeUse::of("String"), MemberMeta::default().id())
                    .property("manager", TypeUse::of("user").optional(), MemberMeta::exposed()),
            );
        let index = builder_for(model).build("schema").expect("should build");

        let user_types: Vec<_> = index.types().filter(|t| t.name == "User").collect();
        assert_eq!(user_types.len(), 1);
        let manager = index.field("User", "manager").expect("field should exist");
        assert_eq!(manager.field_type.type_ref, TypeRef::Resolved("User".to_string()));
    }

    #[test]
    fn test_enum_value_precedence() {
        let constants = vec![EnumConstant::new("OPEN"), EnumConstant::new("DONE")];

        let provider_model = ModelRegistry::new()
            .register(schema_with_query_target("status"))
            .register(
                HostType::enumeration("status", constants.clone())
                    .named("Status")
                    .enum_value_provider(|label| json!(label.len()))
                    .enum_value_expression("'ignored'"),
            );
        let index = builder_for(provider_model).build("schema").expect("should build");
        let status = index.type_named("Status").expect("type should exist");
        assert_eq!(status.enum_values[0].value, json!(4));

        let expression_model = ModelRegistry::new()
            .register(schema_with_query_target("status"))
            .register(
                HostType::enumeration("status", constants.clone())
                    .named("Status")
                    .enum_value_expression("name"),
            );
        let index = builder_for(expression_model).build("schema").expect("should build");
        let status = index.type_named("Status").expect("type should exist");
        assert_eq!(status.enum_values[1].value, json!("DONE"));

        let bare_model = ModelRegistry::new()
            .register(schema_with_query_target("status"))
            .register(HostType::enumeration("status", constants).named("Status"));
        let index = builder_for(bare_model).build("schema").expect("should build");
        let status = index.type_named("Status").expect("type should exist");
        assert_eq!(status.enum_values[0].value, json!("OPEN"));
    }
}
