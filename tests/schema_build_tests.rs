//! Schema graph construction against the shared todo model.

mod common;

use graphforge::prelude::*;
use graphforge::schema::TypeRef;
use std::collections::HashSet;

#[test]
fn test_cyclic_user_type_builds_exactly_once() {
    let schema = common::build_schema();

    let user_count = schema.types().filter(|t| t.name == "User").count();
    assert_eq!(user_count, 1, "one descriptor per admitted type");

    let manager = schema.field("User", "manager").expect("field should exist");
    assert_eq!(
        manager.field_type.type_ref,
        TypeRef::Resolved("User".to_string()),
        "the self-reference should resolve back to the same type"
    );
    assert!(manager.field_type.nullable);
}

#[test]
fn test_type_names_are_unique() {
    let schema = common::build_schema();
    let mut seen = HashSet::new();
    for descriptor in schema.types() {
        assert!(
            seen.insert(descriptor.name.clone()),
            "duplicate type name '{}'",
            descriptor.name
        );
    }
}

#[test]
fn test_no_pending_references_survive_the_build() {
    let schema = common::build_schema();
    for descriptor in schema.types() {
        for possible in &descriptor.possible_types {
            assert!(!possible.is_pending(), "{}: {:?}", descriptor.name, possible);
        }
        for interface in &descriptor.interfaces {
            assert!(!interface.is_pending(), "{}: {:?}", descriptor.name, interface);
        }
        for field in &descriptor.fields {
            assert!(
                !field.field_type.type_ref.is_pending(),
                "{}.{} is unresolved",
                descriptor.name,
                field.name
            );
            for argument in &field.arguments {
                assert!(!argument.argument_type.type_ref.is_pending());
            }
        }
    }
}

#[test]
fn test_mutation_wrapper_shape() {
    let schema = common::build_schema();

    let payload = schema.type_named("addTodoPayload").expect("output wrapper");
    let payload_fields: Vec<&str> = payload.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(payload_fields, vec!["clientMutationId", "todo"]);
    assert_eq!(
        payload.field("todo").expect("return field").field_type.type_ref,
        TypeRef::Resolved("Todo".to_string())
    );

    let input = schema.type_named("addTodoInput").expect("input wrapper");
    let input_fields: Vec<&str> = input.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(input_fields, vec!["clientMutationId", "todo"]);
    assert_eq!(
        input.field("todo").expect("input field").field_type.type_ref,
        TypeRef::Resolved("TodoDraftInput".to_string())
    );

    let mutation = schema.mutation("addTodo").expect("mutation should be registered");
    assert_eq!(mutation.output_field_name, "todo");
    assert_eq!(
        schema.mutation_input_field("addTodo", &HostTypeId::from("todo_draft")),
        Some("todo")
    );
    assert_eq!(
        schema.mutation_output_type("addTodo", &HostTypeId::from("todo")),
        Some("addTodoPayload")
    );
}

#[test]
fn test_mutation_root_lists_registered_mutations() {
    let schema = common::build_schema();
    let root = schema.mutation_type().expect("mutation root should exist");
    assert_eq!(root.name, "Mutation");
    let add_todo = root.field("addTodo").expect("field per mutation");
    assert_eq!(add_todo.arguments.len(), 1);
    assert_eq!(add_todo.arguments[0].name, "input");
    assert!(add_todo.arguments[0].required);
}

#[test]
fn test_argument_default_is_resolved_at_build_time() {
    let schema = common::build_schema();
    let todos = schema.field("User", "todos").expect("field should exist");
    let first = todos.argument("first").expect("argument should exist");
    assert_eq!(first.default_value, Some(json!(1)));
    assert!(!first.required);
}

#[test]
fn test_unexposed_members_are_not_admitted() {
    let schema = common::build_schema();
    let user = schema.type_named("User").expect("type should exist");
    assert!(
        user.field("password_hash").is_none(),
        "exposure is opt-in; unmarked members stay hidden"
    );
}

#[test]
fn test_id_marker_maps_to_id_scalar() {
    let schema = common::build_schema();
    let id = schema.field("User", "id").expect("field should exist");
    assert_eq!(id.field_type.type_ref, TypeRef::Resolved("ID".to_string()));
    assert_eq!(schema.type_named("ID").expect("scalar").kind, TypeKind::Scalar);
}

#[test]
fn test_marker_interface_attachment() {
    let schema = common::build_schema();

    let interface = schema.type_named("Identified").expect("type should exist");
    assert_eq!(interface.kind, TypeKind::Interface);
    assert_eq!(
        interface.field("id").expect("declared signature").field_type.type_ref,
        TypeRef::Resolved("ID".to_string())
    );

    for implementor in ["User", "Todo"] {
        let descriptor = schema.type_named(implementor).expect("type should exist");
        assert!(
            descriptor
                .interfaces
                .iter()
                .any(|i| *i == TypeRef::Resolved("Identified".to_string())),
            "{implementor} should carry the marker interface"
        );
    }
}

#[test]
fn test_union_possible_types() {
    let schema = common::build_schema();
    let union = schema.type_named("SearchResult").expect("type should exist");
    assert_eq!(union.kind, TypeKind::Union);
    let possible: Vec<&str> = union.possible_types.iter().map(|p| p.name()).collect();
    assert_eq!(possible, vec!["Todo", "User"]);
}

#[test]
fn test_enum_constants_use_labels_by_default() {
    let schema = common::build_schema();
    let status = schema.type_named("TodoStatus").expect("type should exist");
    assert_eq!(status.kind, TypeKind::Enum);
    let labels: Vec<&str> = status.enum_values.iter().map(|v| v.label.as_str()).collect();
    assert_eq!(labels, vec!["OPEN", "DONE"]);
    assert_eq!(status.enum_values[0].value, json!("OPEN"));
}
