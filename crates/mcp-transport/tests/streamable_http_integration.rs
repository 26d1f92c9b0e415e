//! End-to-end exercise of `StreamableHttpTransport` against a mock HTTP
//! server: plain JSON request/response, session-id adoption, and the
//! SSE-upgrade path.

use std::collections::HashMap;

use mcp_protocol::{JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, RequestId};
use mcp_transport::config::TransportConfig;
use mcp_transport::{StreamableHttpTransport, Transport};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn transport_for(server: &MockServer) -> StreamableHttpTransport {
    let config = TransportConfig::new(format!("{}/mcp", server.uri()), HashMap::new()).unwrap();
    let transport = StreamableHttpTransport::new(config).unwrap();
    transport.connect().await.unwrap();
    transport
}

#[tokio::test]
async fn plain_json_response_round_trips() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_json(serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": "fixed-id",
                    "result": { "ok": true }
                })),
        )
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let request = JsonRpcRequest {
        id: RequestId::String("fixed-id".into()),
        ..JsonRpcRequest::new("ping", None)
    };
    let response = transport
        .send(&JsonRpcMessage::Request(request))
        .await
        .unwrap()
        .expect("server answered synchronously");

    match response {
        JsonRpcMessage::Response(JsonRpcResponse { id, .. }) => {
            assert_eq!(id, RequestId::String("fixed-id".into()));
        }
        other => panic!("expected a response, got {other:?}"),
    }
}

#[tokio::test]
async fn session_id_header_is_adopted_and_resent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .insert_header("Mcp-Session-Id", "session-abc")
                .set_body_json(serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": "1",
                    "result": {}
                })),
        )
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    assert!(transport.session_id().is_none());

    let request = JsonRpcRequest {
        id: RequestId::String("1".into()),
        ..JsonRpcRequest::new("ping", None)
    };
    transport.send(&JsonRpcMessage::Request(request)).await.unwrap();

    assert_eq!(transport.session_id().as_deref(), Some("session-abc"));

    // A second request must carry the adopted session id back to the server.
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .and(header("Mcp-Session-Id", "session-abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_json(serde_json::json!({ "jsonrpc": "2.0", "id": "2", "result": {} })),
        )
        .mount(&server)
        .await;

    let request2 = JsonRpcRequest {
        id: RequestId::String("2".into()),
        ..JsonRpcRequest::new("ping", None)
    };
    transport.send(&JsonRpcMessage::Request(request2)).await.unwrap();
}

#[tokio::test]
async fn http_error_status_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let request = JsonRpcRequest::new("ping", None);
    let err = transport
        .send(&JsonRpcMessage::Request(request))
        .await
        .unwrap_err();
    assert!(matches!(err, mcp_transport::TransportError::HttpError { status: 500, .. }));
}

#[tokio::test]
async fn http_202_accepted_yields_no_immediate_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let request = JsonRpcRequest::new("notifications/initialized", None);
    let result = transport.send(&JsonRpcMessage::Request(request)).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let server = MockServer::start().await;
    let transport = transport_for(&server).await;
    transport.disconnect().await.unwrap();
    transport.disconnect().await.unwrap();
    assert!(!transport.is_connected());
}

#[tokio::test]
async fn transient_server_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    // First two attempts fail with a retryable 503; the third succeeds.
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_json(serde_json::json!({ "jsonrpc": "2.0", "id": "1", "result": {} })),
        )
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let request = JsonRpcRequest {
        id: RequestId::String("1".into()),
        ..JsonRpcRequest::new("ping", None)
    };
    let response = transport
        .send(&JsonRpcMessage::Request(request))
        .await
        .unwrap()
        .expect("the retried attempt should eventually succeed");
    assert!(matches!(response, JsonRpcMessage::Response(_)));
}

#[tokio::test]
async fn non_retryable_client_errors_fail_on_the_first_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let request = JsonRpcRequest::new("ping", None);
    let err = transport
        .send(&JsonRpcMessage::Request(request))
        .await
        .unwrap_err();
    assert!(matches!(err, mcp_transport::TransportError::HttpError { status: 400, .. }));
}

#[tokio::test]
async fn send_fails_fast_once_disconnected() {
    let server = MockServer::start().await;
    let transport = transport_for(&server).await;
    transport.disconnect().await.unwrap();

    let request = JsonRpcRequest::new("ping", None);
    let err = transport.send(&JsonRpcMessage::Request(request)).await.unwrap_err();
    assert!(matches!(err, mcp_transport::TransportError::SessionError(_)));
}

#[tokio::test]
async fn sse_upgrade_delivers_a_crlf_framed_event() {
    let server = MockServer::start().await;
    // A spec-compliant SSE server may terminate events with CRLF rather than
    // bare LF; the reader must still find the blank-line delimiter.
    let event = "data: {\"jsonrpc\":\"2.0\",\"id\":\"srv-1\",\"result\":{\"ok\":true}}\r\n\r\n";
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_raw(event, "text/event-stream"),
        )
        .mount(&server)
        .await;

    let transport = transport_for(&server).await;
    let request = JsonRpcRequest::new("ping", None);
    let immediate = transport.send(&JsonRpcMessage::Request(request)).await.unwrap();
    assert!(immediate.is_none());

    let message = transport.receive().await.unwrap();
    match message {
        JsonRpcMessage::Response(JsonRpcResponse { id, .. }) => {
            assert_eq!(id, RequestId::String("srv-1".into()));
        }
        other => panic!("expected a JSON-RPC response, got {other:?}"),
    }
}

#[tokio::test]
async fn oversized_response_is_rejected_without_being_parsed() {
    let server = MockServer::start().await;
    let huge_body = serde_json::json!({
        "jsonrpc": "2.0",
        "id": "fixed-id",
        "result": { "padding": "x".repeat(1024) }
    });
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_json(huge_body),
        )
        .mount(&server)
        .await;

    let mut config = TransportConfig::new(format!("{}/mcp", server.uri()), HashMap::new()).unwrap();
    config.limits.max_response_size = Some(16);
    let transport = StreamableHttpTransport::new(config).unwrap();
    transport.connect().await.unwrap();

    let request = JsonRpcRequest::new("ping", None);
    let err = transport.send(&JsonRpcMessage::Request(request)).await.unwrap_err();
    assert!(matches!(err, mcp_transport::TransportError::ReceiveFailed(_)));
}

