//! Inbound `notifications/cancelled` tracking and outbound cancel requests.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use mcp_protocol::{CancellationInfo, RequestId};
use mcp_transport::Transport;
use parking_lot::RwLock;

use crate::client::{Client, ClientError};

pub type CancellationListener = Arc<dyn Fn(CancellationInfo) -> BoxFuture<'static, ()> + Send + Sync>;

/// Dispatches inbound cancellation notifications to per-request and global
/// listeners. Per-request listeners fire at most once, then are dropped.
#[derive(Default)]
pub struct CancellationTracker {
    request_listeners: RwLock<HashMap<String, CancellationListener>>,
    global_listeners: RwLock<Vec<CancellationListener>>,
}

impl CancellationTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_request(&self, request_id: impl Into<String>, listener: CancellationListener) {
        self.request_listeners.write().insert(request_id.into(), listener);
    }

    pub fn on_any(&self, listener: CancellationListener) {
        self.global_listeners.write().push(listener);
    }

    pub async fn handle(&self, info: CancellationInfo) {
        let key = info.request_id.clone();
        let consumed = self.request_listeners.write().remove(&key);
        if let Some(listener) = consumed {
            listener(info.clone()).await;
        }
        let global: Vec<CancellationListener> = self.global_listeners.read().clone();
        for listener in global {
            listener(info.clone()).await;
        }
    }
}

pub fn install_cancellation_listener<T: Transport + 'static>(
    client: &Client<T>,
    tracker: Arc<CancellationTracker>,
) {
    client.on_notification(
        "notifications/cancelled",
        Arc::new(move |params| {
            let tracker = tracker.clone();
            Box::pin(async move {
                let Some(params) = params else { return };
                match serde_json::from_value::<CancellationInfo>(params) {
                    Ok(info) => tracker.handle(info).await,
                    Err(err) => tracing::warn!(error = %err, "malformed cancellation notification"),
                }
            })
        }),
    );
}

/// Cancel an in-flight request owned by the local client.
///
/// Thin wrapper over [`Client::cancel_request`] kept here so all
/// cancellation entry points (inbound dispatch and outbound cancel) live in
/// one module.
///
/// # Errors
/// [`ClientError::InitializeNotCancellable`] for the in-flight `initialize`
/// request; transport errors from the underlying `notifications/cancelled`
/// send.
pub async fn cancel_server_request<T: Transport + 'static>(
    client: &Client<T>,
    id: RequestId,
    reason: Option<String>,
) -> Result<(), ClientError> {
    client.cancel_request(id, reason).await
}
