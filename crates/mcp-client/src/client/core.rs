//! The central `Client<T>` protocol engine: one per connected server.

use std::sync::Arc;
use std::time::Duration;

use mcp_protocol::{
    ClientCapabilities, Implementation, InitializeResult, JsonRpcMessage, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, McpError, NegotiationResult, RequestId,
};
use mcp_transport::{Transport, TransportError};
use parking_lot::RwLock;
use tokio::task::JoinHandle;

use crate::handlers::{HandlerRegistry, NotificationHandler, RequestHandler};
use crate::state::{InvalidStateTransition, ProtocolState, StateMachine};

use super::negotiation::{CapabilityNegotiator, IncompatibleProtocolError};
use super::pending::PendingRequestTable;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_INITIALIZE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_PENDING_REQUESTS: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] McpError),
    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),
    #[error(transparent)]
    IncompatibleProtocol(#[from] IncompatibleProtocolError),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request cancelled: {0}")]
    Cancelled(String),
    #[error("the initialize request cannot be cancelled")]
    InitializeNotCancellable,
}

impl From<ClientError> for McpError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Protocol(e) => e,
            ClientError::Timeout(_) => McpError::timeout(err.to_string()),
            ClientError::Cancelled(reason) => McpError::cancelled(reason),
            other => McpError::internal_error(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
}

struct Inner<T: Transport> {
    transport: T,
    state: StateMachine,
    handlers: HandlerRegistry,
    pending: PendingRequestTable,
    negotiation: RwLock<Option<NegotiationResult>>,
    initialize_request_id: RwLock<Option<RequestId>>,
    receive_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
    default_timeout: Duration,
    initialize_timeout: Duration,
}

/// Per-server JSON-RPC protocol engine, generic over its transport.
///
/// Kept generic (rather than boxing a `dyn Transport`) because a single
/// process only ever drives one transport implementation per client; the
/// bridge holds a collection of `Client<StreamableHttpTransport>` rather
/// than a collection of trait objects.
pub struct Client<T: Transport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Transport + 'static> Client<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_options(transport, DEFAULT_MAX_PENDING_REQUESTS, DEFAULT_REQUEST_TIMEOUT)
    }

    #[must_use]
    pub fn with_options(transport: T, max_pending_requests: usize, default_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                state: StateMachine::new(),
                handlers: HandlerRegistry::default(),
                pending: PendingRequestTable::new(max_pending_requests),
                negotiation: RwLock::new(None),
                initialize_request_id: RwLock::new(None),
                receive_task: parking_lot::Mutex::new(None),
                default_timeout,
                initialize_timeout: DEFAULT_INITIALIZE_TIMEOUT,
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> ProtocolState {
        self.inner.state.current()
    }

    #[must_use]
    pub fn negotiation_result(&self) -> Option<NegotiationResult> {
        self.inner.negotiation.read().clone()
    }

    pub fn on_request(&self, method: impl Into<String>, handler: RequestHandler) {
        self.inner.handlers.on_request(method, handler);
    }

    pub fn on_notification(&self, method: impl Into<String>, handler: NotificationHandler) {
        self.inner.handlers.on_notification(method, handler);
    }

    /// Connect the transport and start the inbound receive loop.
    ///
    /// Moves `DISCONNECTED -> CONNECTING -> INITIALIZING`. Does not perform
    /// the `initialize` handshake itself; call [`Client::initialize`] next.
    ///
    /// # Errors
    /// Returns [`InvalidStateTransition`] if called outside `DISCONNECTED`,
    /// or the transport's connect error.
    pub async fn connect(&self) -> Result<(), ClientError> {
        self.inner.state.transition(ProtocolState::Connecting)?;
        self.inner.transport.connect().await?;
        self.spawn_receive_loop();
        self.inner.state.transition(ProtocolState::Initializing)?;
        Ok(())
    }

    fn spawn_receive_loop(&self) {
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            loop {
                match inner.transport.receive().await {
                    Ok(message) => Self::dispatch_inbound(&inner, message).await,
                    Err(err) => {
                        tracing::warn!(error = %err, "receive loop terminated");
                        inner.state.force(ProtocolState::Disconnected);
                        inner.pending.clear();
                        break;
                    }
                }
            }
        });
        *self.inner.receive_task.lock() = Some(handle);
    }

    async fn dispatch_inbound(inner: &Arc<Inner<T>>, message: JsonRpcMessage) {
        match message {
            JsonRpcMessage::Response(response) => {
                if !inner.pending.resolve(response) {
                    tracing::warn!("dropping response with no matching pending request");
                }
            }
            JsonRpcMessage::Request(request) => {
                let result = inner
                    .handlers
                    .dispatch_request(&request.method, request.params)
                    .await;
                let response = match result {
                    Ok(value) => JsonRpcResponse::success(request.id, value),
                    Err(error) => JsonRpcResponse::error(request.id, error),
                };
                if let Err(err) = inner.transport.send(&JsonRpcMessage::Response(response)).await {
                    tracing::warn!(error = %err, "failed to deliver response to inbound request");
                }
            }
            JsonRpcMessage::Notification(notification) => {
                inner
                    .handlers
                    .dispatch_notification(&notification.method, notification.params)
                    .await;
            }
        }
    }

    /// Send a request and await its correlated response.
    ///
    /// # Errors
    /// [`ClientError::Timeout`] if no response arrives within the effective
    /// timeout; [`ClientError::Protocol`] if the server returned a JSON-RPC
    /// error; [`ClientError::Transport`] on a send failure; otherwise a
    /// structural error from the pending-request table (e.g. capacity).
    pub async fn request(
        &self,
        method: impl Into<String>,
        params: Option<serde_json::Value>,
        options: RequestOptions,
    ) -> Result<serde_json::Value, ClientError> {
        let request = JsonRpcRequest::new(method, params);
        let id = request.id.clone();
        let timeout = options.timeout.unwrap_or(self.inner.default_timeout);

        let rx = self.inner.pending.register(&id)?;

        let immediate = self.inner.transport.send(&JsonRpcMessage::Request(request)).await;
        let immediate = match immediate {
            Ok(value) => value,
            Err(err) => {
                self.inner.pending.remove(&id);
                return Err(err.into());
            }
        };

        if let Some(message) = immediate {
            Self::dispatch_inbound(&self.inner, message).await;
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => response.into_result().map_err(ClientError::Protocol),
            Ok(Err(_recv_error)) => Err(ClientError::Cancelled("client closing".into())),
            Err(_elapsed) => {
                self.inner.pending.remove(&id);
                Err(ClientError::Timeout(timeout))
            }
        }
    }

    /// Fire-and-forget notification; no response is expected.
    ///
    /// # Errors
    /// Propagates transport send failures.
    pub async fn notify(
        &self,
        method: impl Into<String>,
        params: Option<serde_json::Value>,
    ) -> Result<(), ClientError> {
        let notification = JsonRpcNotification::new(method, params);
        self.inner
            .transport
            .send(&JsonRpcMessage::Notification(notification))
            .await?;
        Ok(())
    }

    /// Cancel a pending request: notify the server and fail the local waiter.
    ///
    /// # Errors
    /// [`ClientError::InitializeNotCancellable`] if `id` is the in-flight
    /// `initialize` request.
    pub async fn cancel_request(&self, id: RequestId, reason: Option<String>) -> Result<(), ClientError> {
        if self.inner.initialize_request_id.read().as_ref() == Some(&id) {
            return Err(ClientError::InitializeNotCancellable);
        }
        if self.inner.pending.remove(&id) {
            self.notify(
                "notifications/cancelled",
                Some(serde_json::json!({
                    "requestId": id.to_string(),
                    "reason": reason,
                })),
            )
            .await?;
        }
        Ok(())
    }

    /// Run the `initialize` / `notifications/initialized` handshake.
    ///
    /// # Errors
    /// [`ClientError::IncompatibleProtocol`] if the server's protocol
    /// version is unsupported; any `request()` error otherwise.
    pub async fn initialize(
        &self,
        client_info: Implementation,
        client_capabilities: ClientCapabilities,
    ) -> Result<NegotiationResult, ClientError> {
        let negotiator = CapabilityNegotiator::new(client_info, client_capabilities);
        let params = negotiator.build_request();

        let request = JsonRpcRequest::new("initialize", Some(serde_json::to_value(&params)?));
        *self.inner.initialize_request_id.write() = Some(request.id.clone());

        let id = request.id.clone();
        let rx = self.inner.pending.register(&id)?;
        let immediate = self.inner.transport.send(&JsonRpcMessage::Request(request)).await?;
        if let Some(message) = immediate {
            Self::dispatch_inbound(&self.inner, message).await;
        }
        let response = tokio::time::timeout(self.inner.initialize_timeout, rx)
            .await
            .map_err(|_| ClientError::Timeout(self.inner.initialize_timeout))?
            .map_err(|_| ClientError::Cancelled("client closing".into()))?;
        let result: InitializeResult = serde_json::from_value(response.into_result()?)?;

        let negotiation = negotiator.finalize(result)?;
        *self.inner.negotiation.write() = Some(negotiation.clone());

        self.notify("notifications/initialized", None).await?;
        self.mark_ready()?;
        Ok(negotiation)
    }

    /// Move `INITIALIZING -> READY` after a successful handshake.
    ///
    /// # Errors
    /// [`InvalidStateTransition`] if called outside `INITIALIZING`.
    pub fn mark_ready(&self) -> Result<(), InvalidStateTransition> {
        self.inner.state.transition(ProtocolState::Ready)
    }

    /// Tear the client down: cancel pending requests, stop the receive
    /// loop, and disconnect the transport.
    ///
    /// # Errors
    /// Propagates the transport's disconnect error; the state machine is
    /// always forced to `CLOSED` regardless.
    pub async fn close(&self) -> Result<(), ClientError> {
        let current = self.inner.state.current();
        if current.can_transition_to(ProtocolState::Closing) {
            self.inner.state.transition(ProtocolState::Closing)?;
        }

        if let Some(handle) = self.inner.receive_task.lock().take() {
            handle.abort();
        }
        self.inner.pending.clear();

        let result = self.inner.transport.disconnect().await;
        self.inner.state.force(ProtocolState::Closed);
        result.map_err(ClientError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mcp_transport::TransportResult;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// An in-memory transport double that answers every request
    /// synchronously, without exercising HTTP at all.
    struct LoopbackTransport {
        connected: AtomicBool,
        inbound: Mutex<tokio::sync::mpsc::UnboundedReceiver<JsonRpcMessage>>,
        respond_immediately: bool,
        sent_count: AtomicUsize,
    }

    impl LoopbackTransport {
        fn new(respond_immediately: bool) -> (Self, tokio::sync::mpsc::UnboundedSender<JsonRpcMessage>) {
            let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
            (
                Self {
                    connected: AtomicBool::new(false),
                    inbound: Mutex::new(rx),
                    respond_immediately,
                    sent_count: AtomicUsize::new(0),
                },
                tx,
            )
        }
    }

    #[async_trait]
    impl Transport for LoopbackTransport {
        async fn connect(&self) -> TransportResult<()> {
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn disconnect(&self) -> TransportResult<()> {
            self.connected.store(false, Ordering::SeqCst);
            Ok(())
        }

        async fn send(&self, message: &JsonRpcMessage) -> TransportResult<Option<JsonRpcMessage>> {
            self.sent_count.fetch_add(1, Ordering::SeqCst);
            if self.respond_immediately {
                if let JsonRpcMessage::Request(req) = message {
                    let result = match req.method.as_str() {
                        "initialize" => serde_json::json!({
                            "protocolVersion": mcp_protocol::PROTOCOL_VERSION,
                            "capabilities": {},
                            "serverInfo": {"name": "loopback", "version": "0.0.0"},
                        }),
                        _ => serde_json::json!({"ok": true}),
                    };
                    return Ok(Some(JsonRpcMessage::Response(JsonRpcResponse::success(
                        req.id.clone(),
                        result,
                    ))));
                }
            }
            Ok(None)
        }

        async fn receive(&self) -> TransportResult<JsonRpcMessage> {
            self.inbound
                .lock()
                .await
                .recv()
                .await
                .ok_or_else(|| TransportError::ConnectionLost("closed".into()))
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        fn session_id(&self) -> Option<String> {
            None
        }
    }

    #[tokio::test]
    async fn connect_moves_to_initializing() {
        let (transport, _tx) = LoopbackTransport::new(true);
        let client = Client::new(transport);
        client.connect().await.unwrap();
        assert_eq!(client.state(), ProtocolState::Initializing);
    }

    #[tokio::test]
    async fn full_handshake_reaches_ready() {
        let (transport, _tx) = LoopbackTransport::new(true);
        let client = Client::new(transport);
        client.connect().await.unwrap();
        let negotiation = client
            .initialize(
                Implementation {
                    name: "test".into(),
                    version: "0.0.0".into(),
                    title: None,
                },
                ClientCapabilities::default(),
            )
            .await
            .unwrap();
        assert_eq!(negotiation.protocol_version, mcp_protocol::PROTOCOL_VERSION);
        assert_eq!(client.state(), ProtocolState::Ready);
    }

    #[tokio::test]
    async fn initialize_request_cannot_be_cancelled() {
        let (transport, _tx) = LoopbackTransport::new(true);
        let client = Client::new(transport);
        client.connect().await.unwrap();

        // Register the initialize id without awaiting the full handshake
        // so the cancellation guard can be exercised directly.
        let params = ClientCapabilities::default();
        let negotiator = CapabilityNegotiator::new(
            Implementation {
                name: "t".into(),
                version: "0".into(),
                title: None,
            },
            params,
        );
        let _ = negotiator.build_request();
        let fake_id = RequestId::Number(1);
        *client.inner.initialize_request_id.write() = Some(fake_id.clone());
        let err = client.cancel_request(fake_id, None).await.unwrap_err();
        assert!(matches!(err, ClientError::InitializeNotCancellable));
    }

    #[tokio::test]
    async fn request_times_out_when_no_response_arrives() {
        let (transport, _tx) = LoopbackTransport::new(false);
        let client = Client::new(transport);
        client.connect().await.unwrap();
        let err = client
            .request(
                "tools/list",
                None,
                RequestOptions {
                    timeout: Some(Duration::from_millis(20)),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));
    }

    #[tokio::test]
    async fn close_fails_pending_requests() {
        let (transport, _tx) = LoopbackTransport::new(false);
        let client = Client::new(transport);
        client.connect().await.unwrap();

        let client2 = client.clone();
        let pending = tokio::spawn(async move {
            client2
                .request(
                    "tools/list",
                    None,
                    RequestOptions {
                        timeout: Some(Duration::from_secs(5)),
                    },
                )
                .await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        client.close().await.unwrap();
        let result = pending.await.unwrap();
        assert!(result.is_err());
        assert_eq!(client.state(), ProtocolState::Closed);
    }
}
