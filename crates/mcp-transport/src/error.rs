//! Transport error types.

use thiserror::Error;

pub type TransportResult<T> = std::result::Result<T, TransportError>;

#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },
}

impl TransportError {
    /// Whether a request that failed with this error is worth retrying —
    /// transient network/server conditions, not client-side mistakes.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::ConnectionLost(_) | Self::Timeout(_)
        ) || matches!(self, Self::HttpError { status, .. } if *status >= 500)
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationFailed(err.to_string())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(std::time::Duration::from_secs(0))
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else {
            Self::SendFailed(err.to_string())
        }
    }
}

impl From<TransportError> for mcp_protocol::McpError {
    fn from(err: TransportError) -> Self {
        use mcp_protocol::ErrorCode;
        match &err {
            TransportError::Timeout(_) => mcp_protocol::McpError::new(ErrorCode::RequestTimeout, err.to_string()),
            TransportError::SessionError(_) => {
                mcp_protocol::McpError::new(ErrorCode::SessionExpired, err.to_string())
            }
            _ => mcp_protocol::McpError::internal_error(err.to_string()),
        }
    }
}
