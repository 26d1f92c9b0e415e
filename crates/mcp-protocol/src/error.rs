//! JSON-RPC / MCP error taxonomy.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Canonical JSON-RPC 2.0 and MCP-specific error codes.
///
/// The MCP-specific range is `-32000..=-32099`; everything outside it is
/// the standard JSON-RPC 2.0 set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    RequestTimeout,
    RequestCancelled,
    SessionExpired,
    CapabilityNotSupported,
    ValidationFailed,
    /// Any code not in the fixed set above (server-defined or future MCP codes).
    Other(i64),
}

impl ErrorCode {
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::RequestTimeout => -32001,
            Self::RequestCancelled => -32002,
            Self::SessionExpired => -32003,
            Self::CapabilityNotSupported => -32004,
            Self::ValidationFailed => -32005,
            Self::Other(c) => c,
        }
    }

    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            -32001 => Self::RequestTimeout,
            -32002 => Self::RequestCancelled,
            -32003 => Self::SessionExpired,
            -32004 => Self::CapabilityNotSupported,
            -32005 => Self::ValidationFailed,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
            Self::RequestTimeout => "Request timed out",
            Self::RequestCancelled => "Request cancelled",
            Self::SessionExpired => "Session expired",
            Self::CapabilityNotSupported => "Capability not supported",
            Self::ValidationFailed => "Validation failed",
            Self::Other(_) => "Error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.default_message(), self.code())
    }
}

/// A JSON-RPC error object, also used as the crate-wide protocol error type.
///
/// Mirrors the `MCPError` dataclass-exception hybrid of the source: it is
/// both "the thing sent on the wire" and "the thing raised/returned".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl McpError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The typed error code, recovering the canonical variant by numeric value.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::from_code(self.code)
    }

    #[must_use]
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    #[must_use]
    pub fn method_not_found(method: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            format!("Method not found: {method}"),
        )
    }

    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RequestTimeout, message)
    }

    #[must_use]
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RequestCancelled, message)
    }

    #[must_use]
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SessionExpired, message)
    }

    #[must_use]
    pub fn capability_not_supported(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CapabilityNotSupported, message)
    }

    #[must_use]
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    /// Structured sampling-denial error per the deliberate cleanup recorded
    /// in the design notes: no mixed text/structured response, just this.
    #[must_use]
    pub fn sampling_denied() -> Self {
        Self::new(ErrorCode::InternalError, "Sampling request denied by host")
            .with_data(serde_json::json!({ "reason": "denied" }))
    }
}

impl fmt::Display for McpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for McpError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_round_trips_through_numeric_value() {
        for code in [
            ErrorCode::ParseError,
            ErrorCode::InvalidRequest,
            ErrorCode::MethodNotFound,
            ErrorCode::InvalidParams,
            ErrorCode::InternalError,
            ErrorCode::RequestTimeout,
            ErrorCode::RequestCancelled,
            ErrorCode::SessionExpired,
            ErrorCode::CapabilityNotSupported,
            ErrorCode::ValidationFailed,
        ] {
            assert_eq!(ErrorCode::from_code(code.code()), code);
        }
    }

    #[test]
    fn sampling_denied_carries_structured_reason() {
        let err = McpError::sampling_denied();
        assert_eq!(err.error_code(), ErrorCode::InternalError);
        assert_eq!(err.data.unwrap()["reason"], "denied");
    }

    #[test]
    fn invalid_cursor_detection_matches_canonical_code() {
        let err = McpError::invalid_params("bad cursor");
        assert_eq!(err.error_code(), ErrorCode::InvalidParams);
        assert_eq!(err.code, -32602);
    }
}
