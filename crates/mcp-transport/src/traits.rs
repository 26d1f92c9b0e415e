//! The transport-facing contract the protocol client is generic over.

use async_trait::async_trait;
use mcp_protocol::JsonRpcMessage;

use crate::error::TransportResult;

/// Carries JSON-RPC messages to and from a single MCP server endpoint.
///
/// Implementors own their own inbound queue; `receive` yields the next
/// message regardless of whether it arrived as an immediate HTTP response,
/// an SSE event, or (for other transports) a framed socket read.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self) -> TransportResult<()>;

    async fn disconnect(&self) -> TransportResult<()>;

    /// Send a message. Returns `Some(response)` if the server answered
    /// immediately (HTTP 200 + JSON body), `None` if the response (if any)
    /// will arrive later via `receive` (HTTP 202 or an SSE upgrade).
    async fn send(&self, message: &JsonRpcMessage) -> TransportResult<Option<JsonRpcMessage>>;

    /// Block until the next inbound message is available.
    async fn receive(&self) -> TransportResult<JsonRpcMessage>;

    fn is_connected(&self) -> bool;

    fn session_id(&self) -> Option<String>;
}
