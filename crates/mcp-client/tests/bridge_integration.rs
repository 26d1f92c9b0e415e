//! Bridge fan-out against a mock HTTP server standing in for a real MCP
//! server, matching the teacher's own HTTP-transport testing posture.

use std::time::Duration;

use mcp_client::bridge::{HostCallbacks, HybridBridge};
use mcp_client::config::ServerConfigEntry;
use mcp_protocol::Implementation;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Echoes back the request's JSON-RPC id alongside a fixed `result`, since
/// request ids are client-generated UUIDs a static mock body can't predict.
struct EchoIdResponder {
    result: Value,
}

impl Respond for EchoIdResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let id = body.get("id").cloned().unwrap_or(Value::Null);
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": self.result,
        }))
    }
}

fn client_info() -> Implementation {
    Implementation {
        name: "bridge-test".into(),
        version: "0.1.0".into(),
        title: None,
    }
}

async fn mock_initialize(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .and(body_partial_json(json!({ "method": "initialize" })))
        .respond_with(EchoIdResponder {
            result: json!({
                "protocolVersion": mcp_protocol::PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "mock-server", "version": "9.9.9" },
            }),
        })
        .mount(server)
        .await;

    // `notifications/initialized` is a fire-and-forget POST; no id to echo.
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .and(body_partial_json(json!({ "method": "notifications/initialized" })))
        .respond_with(ResponseTemplate::new(202))
        .mount(server)
        .await;
}

#[tokio::test]
async fn initialize_connects_and_lists_tools_across_servers() {
    let server_a = MockServer::start().await;
    let server_b = MockServer::start().await;
    mock_initialize(&server_a).await;
    mock_initialize(&server_b).await;

    Mock::given(method("POST"))
        .and(path("/mcp"))
        .and(body_partial_json(json!({ "method": "tools/list" })))
        .respond_with(EchoIdResponder {
            result: json!({ "tools": [{ "name": "echo", "inputSchema": {} }] }),
        })
        .mount(&server_a)
        .await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .and(body_partial_json(json!({ "method": "tools/list" })))
        .respond_with(EchoIdResponder {
            result: json!({ "tools": [{ "name": "reverse", "inputSchema": {} }] }),
        })
        .mount(&server_b)
        .await;

    let bridge = HybridBridge::new(client_info(), HostCallbacks::default());
    let configs = vec![
        ServerConfigEntry {
            name: "a".into(),
            url: format!("{}/mcp", server_a.uri()),
            headers: Default::default(),
        },
        ServerConfigEntry {
            name: "b".into(),
            url: format!("{}/mcp", server_b.uri()),
            headers: Default::default(),
        },
    ];

    let failures = tokio::time::timeout(Duration::from_secs(5), bridge.initialize(&configs))
        .await
        .expect("initialize should not hang");
    assert!(failures.is_empty(), "unexpected connect failures");

    let tools = tokio::time::timeout(Duration::from_secs(5), bridge.list_all_tools())
        .await
        .expect("list_all_tools should not hang");
    let mut names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["echo", "reverse"]);
    assert!(tools.iter().all(|t| t.server_url.is_some()));

    bridge.shutdown().await;
    assert!(bridge.registry().connected_urls().is_empty());
}

#[tokio::test]
async fn unreachable_server_is_logged_and_does_not_abort_the_rest() {
    let good = MockServer::start().await;
    mock_initialize(&good).await;

    let bridge = HybridBridge::new(client_info(), HostCallbacks::default());
    let configs = vec![
        ServerConfigEntry {
            name: "unreachable".into(),
            url: "http://127.0.0.1:1/mcp".into(),
            headers: Default::default(),
        },
        ServerConfigEntry {
            name: "good".into(),
            url: format!("{}/mcp", good.uri()),
            headers: Default::default(),
        },
    ];

    let failures = tokio::time::timeout(Duration::from_secs(5), bridge.initialize(&configs))
        .await
        .expect("initialize should not hang");
    assert_eq!(failures.len(), 1);
    assert_eq!(bridge.registry().connected_urls().len(), 1);
}
