//! Wire types for the Model Context Protocol: JSON-RPC envelopes, the error
//! taxonomy, and the typed capability/task/utility payloads exchanged during
//! a session.

pub mod error;
pub mod jsonrpc;
pub mod types;

pub use error::{ErrorCode, McpError};
pub use jsonrpc::{
    JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, JsonRpcResponsePayload,
    JsonRpcVersion, RequestId,
};
pub use types::*;
