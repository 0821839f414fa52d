//! End-to-end flow over the shared todo fixture: query the connection,
//! generate a mutation from the template, run it, inspect the wire shape.

mod common;

use graphforge::prelude::*;

#[tokio::test]
async fn test_paged_todo_query() {
    let schema = common::build_schema();
    let result = QueryExecutor::create(&schema)
        .query("{ viewer { todos(first: 2) { edges { node { id } } } } }")
        .strategy(ExecutionStrategy::Parallel { max_concurrency: 4 })
        .execute()
        .await;

    assert!(result.is_ok(), "{:?}", result.errors);
    let edges = result.data["viewer"]["todos"]["edges"]
        .as_array()
        .expect("edges should be a list");
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0]["node"]["id"], json!("t0"));
    assert_eq!(edges[1]["node"]["id"], json!("t1"));
    assert!(result.complexity >= 0.0);
}

#[tokio::test]
async fn test_argument_default_applies_when_omitted() {
    let schema = common::build_schema();
    let result = QueryExecutor::create(&schema)
        .query("{ viewer { todos { edges { node { id } } } } }")
        .execute()
        .await;

    assert!(result.is_ok(), "{:?}", result.errors);
    let edges = result.data["viewer"]["todos"]["edges"]
        .as_array()
        .expect("edges should be a list");
    assert_eq!(edges.len(), 1, "the declared default of 1 should apply");
}

#[tokio::test]
async fn test_generated_mutation_round_trip() {
    let schema = common::build_schema();
    let template = MutationQueryTemplate::new(&schema);

    let generated = template
        .for_mutation(
            "addTodo",
            &[(HostTypeId::from("todo_draft"), json!({"title": "From template"}))],
        )
        .expect("mutation is registered");

    assert!(
        generated
            .query
            .starts_with("mutation addTodoQuery($input: addTodoInput!)"),
        "unexpected query text: {}",
        generated.query
    );
    assert!(generated.query.contains("addTodo(input: $input)"));
    assert!(generated.query.contains("clientMutationId"));
    assert!(generated.query.contains("title"));

    let injected_id = generated.variables["input"]["clientMutationId"]
        .as_str()
        .expect("a correlation id should be injected")
        .to_string();
    assert_eq!(generated.variables["input"]["todo"]["title"], json!("From template"));

    let variables = generated
        .variables
        .as_object()
        .expect("variables are an object")
        .clone();
    let result = QueryExecutor::create(&schema)
        .query(&generated.query)
        .variables(variables)
        .execute()
        .await;

    assert!(result.is_ok(), "{:?}", result.errors);
    let payload = &result.data["addTodo"];
    assert_eq!(payload["clientMutationId"], json!(injected_id));
    assert_eq!(payload["todo"]["title"], json!("From template"));
    assert_eq!(payload["todo"]["id"], json!("todo-1001"));
}

#[tokio::test]
async fn test_template_rejects_unknown_mutation() {
    let schema = common::build_schema();
    let template = MutationQueryTemplate::new(&schema);
    let error = template
        .for_mutation("removeTodo", &[])
        .expect_err("no such mutation");
    assert!(matches!(error, SchemaError::UnknownMutation { .. }));
}

#[tokio::test]
async fn test_serialized_result_shape() {
    let schema = common::build_schema();
    let result = QueryExecutor::create(&schema)
        .query("{ viewer { id } boom }")
        .execute()
        .await;

    let wire = serde_json::to_value(&result).expect("result serializes");
    assert_eq!(wire["data"]["viewer"]["id"], json!("u1"));
    let errors = wire["errors"].as_array().expect("errors are present");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["kind"], json!("FIELD_RESOLUTION"));
    assert_eq!(errors[0]["path"], json!(["boom"]));
}
