//! Inbound `notifications/message` handling and outbound `logging/setLevel`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use mcp_protocol::{LogLevel, LogMessage};
use mcp_transport::Transport;
use parking_lot::RwLock;

use crate::client::{Client, ClientError, RequestOptions};

/// Dispatches inbound log messages, applying a minimum-level filter and
/// optionally forwarding to `tracing` under a configurable target prefix.
pub struct LoggingHandler {
    min_level: RwLock<LogLevel>,
    target_prefix: String,
    messages_seen: AtomicU64,
    messages_filtered: AtomicU32,
    level_counts: RwLock<HashMap<LogLevel, u64>>,
}

impl LoggingHandler {
    #[must_use]
    pub fn new(min_level: LogLevel, target_prefix: impl Into<String>) -> Self {
        Self {
            min_level: RwLock::new(min_level),
            target_prefix: target_prefix.into(),
            messages_seen: AtomicU64::new(0),
            messages_filtered: AtomicU32::new(0),
            level_counts: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn min_level(&self) -> LogLevel {
        *self.min_level.read()
    }

    #[must_use]
    pub fn messages_seen(&self) -> u64 {
        self.messages_seen.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn messages_filtered(&self) -> u32 {
        self.messages_filtered.load(Ordering::Relaxed)
    }

    /// Message counts by level, accumulated unconditionally before the
    /// min-level filter gate — a level that never passes the filter still
    /// shows up here.
    #[must_use]
    pub fn level_counts(&self) -> HashMap<LogLevel, u64> {
        self.level_counts.read().clone()
    }

    pub fn handle(&self, message: LogMessage) {
        self.messages_seen.fetch_add(1, Ordering::Relaxed);
        *self.level_counts.write().entry(message.level).or_insert(0) += 1;
        if message.level < *self.min_level.read() {
            self.messages_filtered.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let logger = message.logger.as_deref().unwrap_or("server");
        let target = format!("{}::{}", self.target_prefix, logger);
        match message.level.as_tracing_level() {
            tracing::Level::ERROR => tracing::error!(target: "mcp_client::remote_log", %target, data = %message.data),
            tracing::Level::WARN => tracing::warn!(target: "mcp_client::remote_log", %target, data = %message.data),
            tracing::Level::INFO => tracing::info!(target: "mcp_client::remote_log", %target, data = %message.data),
            _ => tracing::debug!(target: "mcp_client::remote_log", %target, data = %message.data),
        }
    }
}

/// Register the `notifications/message` listener that feeds `handler`.
pub fn install_logging_listener<T: Transport + 'static>(client: &Client<T>, handler: Arc<LoggingHandler>) {
    client.on_notification(
        "notifications/message",
        Arc::new(move |params| {
            let handler = handler.clone();
            Box::pin(async move {
                let Some(params) = params else { return };
                match serde_json::from_value::<LogMessage>(params) {
                    Ok(message) => handler.handle(message),
                    Err(err) => tracing::warn!(error = %err, "malformed log notification"),
                }
            })
        }),
    );
}

/// Ask the server to filter emitted log messages at `level` or above, and
/// update the local handler's cached level only once the server confirms.
///
/// # Errors
/// Propagates `request()` failures; on error the cached level is left
/// unchanged.
pub async fn set_log_level<T: Transport + 'static>(
    client: &Client<T>,
    handler: &LoggingHandler,
    level: LogLevel,
) -> Result<(), ClientError> {
    client
        .request(
            "logging/setLevel",
            Some(serde_json::json!({ "level": level.as_str() })),
            RequestOptions::default(),
        )
        .await?;
    *handler.min_level.write() = level;
    Ok(())
}
