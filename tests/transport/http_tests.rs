// Streamable-HTTP transport tests against an in-process axum MCP server
//
// The mock answers JSON for most requests and an SSE stream for ping, pages
// its tool listing, and hands out a session id during initialize.

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use toolloop_core::config::RegistrySettings;
use toolloop_core::{
    AgentOptions, Arguments, ModelClient, ModelError, ModelGateway, Orchestrator,
    PromptCompiler, RegistryError, ToolRegistryClient,
};

const SESSION: &str = "session-1";

#[derive(Default)]
struct MockState {
    methods: Mutex<Vec<String>>,
    sessions: Mutex<Vec<Option<String>>>,
}

async fn handle(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(message): Json<Value>,
) -> Response {
    let method = message["method"].as_str().unwrap_or_default().to_string();
    state.methods.lock().expect("lock").push(method.clone());
    state.sessions.lock().expect("lock").push(
        headers
            .get("mcp-session-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    );

    let Some(id) = message.get("id").cloned() else {
        return StatusCode::ACCEPTED.into_response();
    };

    match method.as_str() {
        "initialize" => (
            [("mcp-session-id", SESSION)],
            Json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "protocolVersion": "2025-06-18",
                    "capabilities": {"tools": {"listChanged": false}},
                    "serverInfo": {"name": "mock-catalog", "version": "0.1.0"}
                }
            })),
        )
            .into_response(),
        "ping" => {
            let body = format!(
                "event: message\ndata: {}\n\n",
                json!({"jsonrpc": "2.0", "id": id, "result": {}})
            );
            ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
        }
        "tools/list" => {
            let result = if message["params"]["cursor"].is_null() {
                json!({
                    "tools": [{
                        "name": "obtain_product_from_db",
                        "description": "Get a product by ID from the DB.\n\nReturns the full record.",
                        "inputSchema": {
                            "type": "object",
                            "properties": {"product_id": {"type": "integer"}},
                            "required": ["product_id"]
                        }
                    }],
                    "nextCursor": "page-2"
                })
            } else {
                json!({
                    "tools": [{
                        "name": "retired_tool",
                        "inputSchema": {"type": "object", "properties": {}}
                    }]
                })
            };
            Json(json!({"jsonrpc": "2.0", "id": id, "result": result})).into_response()
        }
        "tools/call" => {
            let name = message["params"]["name"].as_str().unwrap_or_default();
            let product_id = message["params"]["arguments"]["product_id"].as_i64();
            let body = match (name, product_id) {
                ("obtain_product_from_db", Some(2)) => json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": {
                        "content": [{"type": "text", "text": "{\"id\": 2, \"name\": \"Coffee Mug\"}"}],
                        "structuredContent": {"id": 2, "name": "Coffee Mug", "price": 12.5},
                        "isError": false
                    }
                }),
                ("obtain_product_from_db", _) => json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": {
                        "content": [{"type": "text", "text": "NotFound"}],
                        "isError": true
                    }
                }),
                _ => json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {"code": -32602, "message": format!("Unknown tool: {name}")}
                }),
            };
            Json(body).into_response()
        }
        _ => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": -32601, "message": "Method not found"}
        }))
        .into_response(),
    }
}

async fn spawn_server() -> (String, Arc<MockState>) {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/mcp", post(handle))
        .with_state(Arc::clone(&state));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/mcp"), state)
}

fn registry(url: String) -> ToolRegistryClient {
    let settings = RegistrySettings {
        url: Some(url),
        connect_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(5),
        ..RegistrySettings::default()
    };
    ToolRegistryClient::from_settings(&settings).expect("registry client")
}

#[tokio::test]
async fn handshake_pings_over_sse_and_reuses_session() {
    let (url, state) = spawn_server().await;
    let client = registry(url);

    client.connect().await.expect("connect");
    client.list_tools().await.expect("listing");

    let methods = state.methods.lock().expect("lock").clone();
    assert_eq!(
        methods,
        [
            "initialize",
            "notifications/initialized",
            "ping",
            "tools/list",
            "tools/list"
        ]
    );
    let sessions = state.sessions.lock().expect("lock").clone();
    assert_eq!(sessions[0], None);
    assert!(
        sessions[1..]
            .iter()
            .all(|session| session.as_deref() == Some(SESSION))
    );
}

#[tokio::test]
async fn listing_follows_cursor_and_reduces_metadata() {
    let (url, _) = spawn_server().await;
    let client = registry(url);
    client.connect().await.expect("connect");

    let tools = client.list_tools().await.expect("listing");
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0].name, "obtain_product_from_db");
    assert_eq!(tools[0].short_description, "Get a product by ID from the DB.");
    assert_eq!(tools[0].parameters[0].type_label, "integer");
    assert_eq!(tools[1].short_description, "No description.");
    assert!(tools[1].parameters.is_empty());
}

#[tokio::test]
async fn invocation_failures_are_classified() {
    let (url, _) = spawn_server().await;
    let client = registry(url);
    client.connect().await.expect("connect");
    client.list_tools().await.expect("listing");

    let missing: Arguments = [("product_id", json!(99))].into_iter().collect();
    let err = client
        .invoke("obtain_product_from_db", &missing)
        .await
        .expect_err("tool error");
    assert!(matches!(err, RegistryError::Invocation { ref message, .. } if message == "NotFound"));

    let err = client
        .invoke("retired_tool", &Arguments::new())
        .await
        .expect_err("rpc error");
    assert_eq!(err.kind(), "InvocationError");
    assert!(err.to_string().contains("Unknown tool: retired_tool"));

    let err = client
        .invoke("never_listed", &Arguments::new())
        .await
        .expect_err("unknown");
    assert_eq!(err.kind(), "UnknownToolError");
}

#[tokio::test]
async fn unreachable_server_is_a_connectivity_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = registry(format!("http://{addr}/mcp"));
    let err = client.connect().await.expect_err("nothing listening");
    assert!(matches!(
        err,
        RegistryError::Connectivity { ref reason, .. } if reason.starts_with("not reachable")
    ));
}

struct TwoStepModel {
    replies: Mutex<Vec<&'static str>>,
}

#[async_trait]
impl ModelClient for TwoStepModel {
    fn id(&self) -> &str {
        "two-step"
    }

    async fn generate_content(&self, prompt: String) -> Result<String, ModelError> {
        let mut replies = self.replies.lock().expect("lock");
        if replies.len() == 1 {
            assert!(prompt.contains("RESULT: {\"id\":2,\"name\":\"Coffee Mug\",\"price\":12.5}"));
        }
        Ok(replies.remove(0).to_string())
    }
}

#[tokio::test]
async fn orchestrator_runs_over_http_registry() {
    let (url, _) = spawn_server().await;
    let model = TwoStepModel {
        replies: Mutex::new(vec![
            "FUNCTION_CALL: obtain_product_from_db|product_id=2",
            "FINAL_ANSWER: The Coffee Mug costs 12.5",
        ]),
    };
    let agent = Orchestrator::new(
        Arc::new(registry(url)),
        ModelGateway::new(Arc::new(model), Duration::from_secs(2)),
        PromptCompiler::default(),
        AgentOptions::default(),
    );
    agent.connect().await.expect("connect");

    let outcome = agent
        .run("Show me the details of the product with ID 2")
        .await
        .expect("loop finishes");
    assert_eq!(outcome.answer, "The Coffee Mug costs 12.5");
    assert_eq!(outcome.steps.len(), 1);
}
