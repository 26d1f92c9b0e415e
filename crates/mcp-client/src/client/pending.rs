//! Table of in-flight requests awaiting a response.

use std::collections::HashMap;

use mcp_protocol::{JsonRpcResponse, McpError, RequestId};
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Bounded table mapping an outgoing request id to the `oneshot` sender that
/// will wake the caller once a matching response arrives (or the request is
/// cancelled / the connection is torn down).
pub struct PendingRequestTable {
    waiters: Mutex<HashMap<String, oneshot::Sender<JsonRpcResponse>>>,
    max_pending: usize,
}

impl PendingRequestTable {
    #[must_use]
    pub fn new(max_pending: usize) -> Self {
        Self {
            waiters: Mutex::new(HashMap::new()),
            max_pending,
        }
    }

    /// Register `id`, returning the receiving half of the waiter channel.
    ///
    /// # Errors
    /// Returns `McpError::internal_error` if the table is already at
    /// capacity, so a runaway caller cannot exhaust memory with unanswered
    /// requests.
    pub fn register(&self, id: &RequestId) -> Result<oneshot::Receiver<JsonRpcResponse>, McpError> {
        let mut waiters = self.waiters.lock();
        if waiters.len() >= self.max_pending {
            return Err(McpError::internal_error(format!(
                "too many pending requests (limit {})",
                self.max_pending
            )));
        }
        let (tx, rx) = oneshot::channel();
        waiters.insert(id.to_string(), tx);
        Ok(rx)
    }

    /// Complete the waiter for `response.id`, if still registered.
    ///
    /// Returns `true` if a waiter was found and notified.
    pub fn resolve(&self, response: JsonRpcResponse) -> bool {
        let id = response.id.to_string();
        if let Some(tx) = self.waiters.lock().remove(&id) {
            let _ = tx.send(response);
            true
        } else {
            false
        }
    }

    /// Remove and drop the waiter for `id` without resolving it (used by
    /// `cancel_request`; the caller independently notifies the pending
    /// future via its own path).
    pub fn remove(&self, id: &RequestId) -> bool {
        self.waiters.lock().remove(&id.to_string()).is_some()
    }

    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.waiters.lock().contains_key(&id.to_string())
    }

    pub fn len(&self) -> usize {
        self.waiters.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain all waiters, dropping their senders so every pending caller
    /// observes a closed channel. Used when the connection is torn down.
    pub fn clear(&self) {
        self.waiters.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_protocol::ErrorCode;

    #[test]
    fn rejects_registration_past_capacity() {
        let table = PendingRequestTable::new(1);
        table.register(&RequestId::Number(1)).unwrap();
        let err = table.register(&RequestId::Number(2)).unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::InternalError);
    }

    #[tokio::test]
    async fn resolve_wakes_the_matching_waiter() {
        let table = PendingRequestTable::new(4);
        let id = RequestId::Number(7);
        let rx = table.register(&id).unwrap();
        let response = JsonRpcResponse::success(id.clone(), serde_json::json!("ok"));
        assert!(table.resolve(response));
        let received = rx.await.unwrap();
        assert_eq!(received.id, id);
    }

    #[test]
    fn resolve_is_noop_for_unknown_id() {
        let table = PendingRequestTable::new(4);
        let response = JsonRpcResponse::success(RequestId::Number(99), serde_json::json!(null));
        assert!(!table.resolve(response));
    }

    #[test]
    fn clear_drops_all_waiters() {
        let table = PendingRequestTable::new(4);
        table.register(&RequestId::Number(1)).unwrap();
        table.register(&RequestId::Number(2)).unwrap();
        table.clear();
        assert!(table.is_empty());
    }
}
