//! Inbound method/notification dispatch tables.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use mcp_protocol::McpError;
use parking_lot::RwLock;
use serde_json::Value;

pub type RequestHandler =
    Arc<dyn Fn(Option<Value>) -> BoxFuture<'static, Result<Value, McpError>> + Send + Sync>;
pub type NotificationHandler = Arc<dyn Fn(Option<Value>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Registered inbound handlers, keyed by JSON-RPC method name.
///
/// Request handlers are one-per-method (the last registration wins, mirroring
/// a plain dict assignment); notification listeners are many-per-method.
#[derive(Default)]
pub struct HandlerRegistry {
    requests: RwLock<HashMap<String, RequestHandler>>,
    notifications: RwLock<HashMap<String, Vec<NotificationHandler>>>,
}

impl HandlerRegistry {
    pub fn on_request(&self, method: impl Into<String>, handler: RequestHandler) {
        self.requests.write().insert(method.into(), handler);
    }

    pub fn on_notification(&self, method: impl Into<String>, handler: NotificationHandler) {
        self.notifications
            .write()
            .entry(method.into())
            .or_default()
            .push(handler);
    }

    pub fn has_request_handler(&self, method: &str) -> bool {
        self.requests.read().contains_key(method)
    }

    /// Invoke the handler registered for `method`, if any.
    ///
    /// # Errors
    /// Returns `McpError::method_not_found` if nothing is registered. Errors
    /// raised by the handler itself are returned unchanged; the caller
    /// (the receive loop) is responsible for converting any non-`McpError`
    /// failure to `INTERNAL_ERROR` before sending the JSON-RPC response.
    pub async fn dispatch_request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let handler = self.requests.read().get(method).cloned();
        match handler {
            Some(handler) => handler(params).await,
            None => Err(McpError::method_not_found(method)),
        }
    }

    pub async fn dispatch_notification(&self, method: &str, params: Option<Value>) {
        let listeners: Vec<NotificationHandler> = self
            .notifications
            .read()
            .get(method)
            .cloned()
            .unwrap_or_default();
        for listener in listeners {
            listener(params.clone()).await;
        }
    }
}
