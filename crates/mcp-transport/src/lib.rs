//! Streamable HTTP transport for the Model Context Protocol.
//!
//! This crate deliberately implements a single transport — the
//! Streamable-HTTP wire contract MCP requires — rather than a general
//! purpose HTTP client abstraction.

pub mod config;
pub mod error;
pub mod events;
pub mod streamable_http;
pub mod traits;

pub use config::{LimitsConfig, RetryPolicy, TransportConfig};
pub use error::{TransportError, TransportResult};
pub use events::{TransportEvent, TransportEventType};
pub use streamable_http::StreamableHttpTransport;
pub use traits::Transport;
