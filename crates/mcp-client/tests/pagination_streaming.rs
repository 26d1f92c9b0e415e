//! `iter_tools`/`iter_tool_pages` against a two-page mock server, confirming
//! the streaming adapters follow the cursor chain the same way `list_all`
//! does, without buffering every page up front.

use std::collections::HashMap;

use futures::StreamExt;
use mcp_client::client::Client;
use mcp_client::{iter_tool_pages, iter_tools};
use mcp_transport::config::TransportConfig;
use mcp_transport::StreamableHttpTransport;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Serves `tools/list` across two pages, keyed off the request's `cursor`
/// param — the first request (no cursor) gets page one with a `nextCursor`,
/// the follow-up request (cursor `"page-2"`) gets the final page.
struct TwoPageToolsResponder;

impl Respond for TwoPageToolsResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let id = body.get("id").cloned().unwrap_or(Value::Null);
        let cursor = body
            .get("params")
            .and_then(|p| p.get("cursor"))
            .and_then(Value::as_str);

        let result = match cursor {
            None => json!({ "tools": [{ "name": "first", "inputSchema": {} }], "nextCursor": "page-2" }),
            Some("page-2") => json!({ "tools": [{ "name": "second", "inputSchema": {} }] }),
            Some(other) => panic!("unexpected cursor: {other}"),
        };
        ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
    }
}

async fn connected_client(server: &MockServer) -> Client<StreamableHttpTransport> {
    let config = TransportConfig::new(format!("{}/mcp", server.uri()), HashMap::new()).unwrap();
    let transport = StreamableHttpTransport::new(config).unwrap();
    let client = Client::new(transport);
    client.connect().await.unwrap();
    client
}

#[tokio::test]
async fn iter_tools_follows_the_cursor_chain_across_pages() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(TwoPageToolsResponder)
        .mount(&server)
        .await;

    let client = connected_client(&server).await;

    let names: Vec<String> = iter_tools(&client)
        .map(|r| r.unwrap().name)
        .collect()
        .await;
    assert_eq!(names, vec!["first", "second"]);
}

#[tokio::test]
async fn iter_tool_pages_yields_one_page_at_a_time() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(TwoPageToolsResponder)
        .mount(&server)
        .await;

    let client = connected_client(&server).await;

    let pages: Vec<usize> = iter_tool_pages(&client)
        .map(|r| r.unwrap().items.len())
        .collect()
        .await;
    assert_eq!(pages, vec![1, 1]);
}
