//! Tracking and dispatch for `notifications/progress`.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use mcp_protocol::{ProgressInfo, ProgressToken};
use mcp_transport::Transport;
use parking_lot::RwLock;

use crate::client::Client;

pub type ProgressListener = Arc<dyn Fn(ProgressInfo) -> BoxFuture<'static, ()> + Send + Sync>;

/// Per-token progress state plus dispatch to token-specific and global
/// listeners.
#[derive(Default)]
pub struct ProgressTracker {
    state: RwLock<HashMap<String, ProgressInfo>>,
    token_listeners: RwLock<HashMap<String, Vec<ProgressListener>>>,
    global_listeners: RwLock<Vec<ProgressListener>>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_token(&self, token: impl Into<String>, listener: ProgressListener) {
        self.token_listeners
            .write()
            .entry(token.into())
            .or_default()
            .push(listener);
    }

    pub fn on_any(&self, listener: ProgressListener) {
        self.global_listeners.write().push(listener);
    }

    #[must_use]
    pub fn snapshot(&self, token: &ProgressToken) -> Option<ProgressInfo> {
        self.state.read().get(&token.to_string()).cloned()
    }

    pub async fn handle(&self, info: ProgressInfo) {
        let key = info.progress_token.to_string();

        if let Some(previous) = self.state.read().get(&key) {
            if info.progress < previous.progress {
                tracing::warn!(
                    token = %key,
                    previous = previous.progress,
                    current = info.progress,
                    "progress regressed; dispatching anyway"
                );
            }
        }
        self.state.write().insert(key.clone(), info.clone());

        let token_listeners: Vec<ProgressListener> = self
            .token_listeners
            .read()
            .get(&key)
            .cloned()
            .unwrap_or_default();
        for listener in token_listeners {
            listener(info.clone()).await;
        }

        let global: Vec<ProgressListener> = self.global_listeners.read().clone();
        for listener in global {
            listener(info.clone()).await;
        }
    }
}

/// Register the `notifications/progress` listener that feeds `tracker`.
pub fn install_progress_listener<T: Transport + 'static>(client: &Client<T>, tracker: Arc<ProgressTracker>) {
    client.on_notification(
        "notifications/progress",
        Arc::new(move |params| {
            let tracker = tracker.clone();
            Box::pin(async move {
                let Some(params) = params else { return };
                match serde_json::from_value::<ProgressInfo>(params) {
                    Ok(info) => tracker.handle(info).await,
                    Err(err) => tracing::warn!(error = %err, "malformed progress notification"),
                }
            })
        }),
    );
}
