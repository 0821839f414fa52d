//! Shared test fixture: a small todo-tracking model with a cyclic user
//! graph, a paged todo connection, an enum, a union and one mutation.

use anyhow::anyhow;
use graphforge::prelude::*;
use std::sync::{Mutex, Once};
use tokio::time::{sleep, Duration};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Resolver service for the schema host (mutations). Applied mutations are
/// logged so tests can assert sequential ordering.
pub struct SchemaService {
    pub applied: Arc<Mutex<Vec<String>>>,
}

pub struct QueryService;
pub struct UserService;
pub struct TodoService;

pub fn todo_json(index: usize) -> Value {
    json!({
        "id": format!("t{index}"),
        "title": format!("Todo #{index}"),
        "status": "OPEN",
        "createdAt": "2024-05-20T12:00:00+00:00",
        "__type": "todo",
    })
}

fn viewer_json() -> Value {
    json!({
        "id": "u1",
        "name": "Ada",
        "manager": {
            "id": "u0",
            "name": "Grace",
            "manager": null,
        },
        "__type": "user",
    })
}

fn build_model() -> ModelRegistry {
    ModelRegistry::new()
        .register(
            HostType::object("schema")
                .property(
                    "query",
                    TypeUse::of("query_root"),
                    MemberMeta::default().schema_query(),
                )
                .resolver(
                    "add_todo",
                    TypeUse::of("todo"),
                    vec![RawParam::input("todo", TypeUse::of("todo_draft"))],
                    invoker(|service, mut args| async move {
                        let service = service
                            .downcast_ref::<SchemaService>()
                            .ok_or_else(|| anyhow!("unexpected service"))?;
                        let draft = args.remove(0);
                        let title = draft
                            .get("title")
                            .and_then(Value::as_str)
                            .unwrap_or("untitled")
                            .to_string();
                        service
                            .applied
                            .lock()
                            .expect("lock poisoned")
                            .push(title.clone());
                        Ok(json!({
                            "id": "todo-1001",
                            "title": title,
                            "status": "OPEN",
                            "createdAt": "2024-05-20T12:00:00+00:00",
                        }))
                    }),
                    MemberMeta::mutation("addTodo").out("todo"),
                ),
        )
        .register(
            HostType::object("query_root")
                .named("Query")
                .resolver(
                    "viewer",
                    TypeUse::of("user"),
                    vec![],
                    invoker(|_service, _args| async move { Ok(viewer_json()) }),
                    MemberMeta::exposed(),
                )
                .resolver(
                    "boom",
                    TypeUse::of("String").optional(),
                    vec![],
                    invoker(|_service, _args| async move {
                        Err(anyhow!("database unavailable"))
                    }),
                    MemberMeta::exposed(),
                )
                .resolver(
                    "search",
                    TypeUse::list_of("search_result"),
                    vec![],
                    invoker(|_service, _args| async move {
                        Ok(json!([todo_json(0), viewer_json()]))
                    }),
                    MemberMeta::exposed(),
                ),
        )
        .register(
            HostType::interface("identified")
                .named("Identified")
                .method_signature("id", TypeUse::of("String"), vec![], MemberMeta::default().id()),
        )
        .register(
            HostType::object("user")
                .named("User")
                .implements("identified")
                .property("id", TypeUse::of("String"), MemberMeta::default().id())
                .property("name", TypeUse::of("String"), MemberMeta::exposed())
                .property(
                    "manager",
                    TypeUse::of("user").optional(),
                    MemberMeta::exposed(),
                )
                .property("password_hash", TypeUse::of("String"), MemberMeta::default())
                .resolver(
                    "todos",
                    TypeUse::of("todo_connection"),
                    vec![
                        RawParam::input("first", TypeUse::of("i32").optional())
                            .with_meta(MemberMeta::input("first").default_expression("1")),
                        RawParam::by_type("ctx", TypeUse::of("request_context")),
                    ],
                    invoker(|service, args| async move {
                        service
                            .downcast_ref::<UserService>()
                            .ok_or_else(|| anyhow!("unexpected service"))?;
                        let first = args[0].as_i64().unwrap_or(1).clamp(0, 5) as usize;
                        let edges: Vec<Value> = (0..first)
                            .map(|index| json!({ "node": todo_json(index) }))
                            .collect();
                        Ok(json!({ "edges": edges }))
                    }),
                    // page cost scales with the requested page size
                    MemberMeta::exposed().cost("first * childScore"),
                ),
        )
        .register(
            HostType::object("todo")
                .named("Todo")
                .implements("identified")
                .property("id", TypeUse::of("String"), MemberMeta::default().id())
                .property("title", TypeUse::of("String"), MemberMeta::exposed())
                .property(
                    "status",
                    TypeUse::of("todo_status"),
                    MemberMeta::exposed(),
                )
                .property(
                    "createdAt",
                    TypeUse::of("DateTime"),
                    MemberMeta::exposed(),
                )
                .resolver(
                    "label",
                    TypeUse::of("String"),
                    vec![RawParam::by_type("todo", TypeUse::of("todo"))],
                    invoker(|service, args| async move {
                        service
                            .downcast_ref::<TodoService>()
                            .ok_or_else(|| anyhow!("unexpected service"))?;
                        let id = args[0]
                            .get("id")
                            .and_then(Value::as_str)
                            .unwrap_or("t0")
                            .to_string();
                        let index: u64 = id.trim_start_matches('t').parse().unwrap_or(0);
                        // earlier elements sleep longer, reversing completion order
                        sleep(Duration::from_millis((5 - index.min(5)) * 15)).await;
                        Ok(json!(format!("label-{id}")))
                    }),
                    MemberMeta::exposed(),
                ),
        )
        .register(
            HostType::object("todo_connection")
                .named("TodoConnection")
                .property(
                    "edges",
                    TypeUse::list_of("todo_edge"),
                    MemberMeta::exposed(),
                ),
        )
        .register(
            HostType::object("todo_edge")
                .named("TodoEdge")
                .property("node", TypeUse::of("todo"), MemberMeta::exposed()),
        )
        .register(
            HostType::object("todo_draft")
                .named("TodoDraft")
                .property("title", TypeUse::of("String"), MemberMeta::exposed()),
        )
        .register(
            HostType::enumeration(
                "todo_status",
                vec![EnumConstant::new("OPEN"), EnumConstant::new("DONE")],
            )
            .named("TodoStatus"),
        )
        .register(
            HostType::union(
                "search_result",
                vec![HostTypeId::from("todo"), HostTypeId::from("user")],
            )
            .named("SearchResult"),
        )
}

pub fn build_schema_with_log(applied: Arc<Mutex<Vec<String>>>) -> SchemaIndex {
    init_tracing();
    let locator = InMemoryLocator::new()
        .register("schema", SchemaService { applied })
        .register("query_root", QueryService)
        .register("user", UserService)
        .register("todo", TodoService);
    SchemaBuilder::new(build_model(), SchemaConfig::default(), Arc::new(locator))
        .build("schema")
        .expect("schema should build")
}

pub fn build_schema() -> SchemaIndex {
    build_schema_with_log(Arc::new(Mutex::new(Vec::new())))
}
