//! Streamable HTTP transport per the MCP 2025-11-25 specification.
//!
//! Supports HTTP POST for client-to-server messages, with optional
//! per-response upgrade to a Server-Sent Events stream for server-initiated
//! messages, and `Mcp-Session-Id` session tracking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use futures_util::StreamExt;
use mcp_protocol::JsonRpcMessage;
use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio::task::JoinHandle;

use crate::config::TransportConfig;
use crate::error::{TransportError, TransportResult};
use crate::events::{TransportEvent, TransportEventType};
use crate::traits::Transport;

const SESSION_HEADER: &str = "Mcp-Session-Id";

pub struct StreamableHttpTransport {
    config: TransportConfig,
    http: reqwest::Client,
    connected: AtomicBool,
    closing: AtomicBool,
    session_id: RwLock<Option<String>>,
    inbound_tx: mpsc::UnboundedSender<JsonRpcMessage>,
    inbound_rx: Mutex<mpsc::UnboundedReceiver<JsonRpcMessage>>,
    sse_task: Mutex<Option<JoinHandle<()>>>,
    semaphore: Semaphore,
}

impl StreamableHttpTransport {
    /// # Errors
    /// Propagates failures building the underlying `reqwest::Client` (TLS
    /// backend setup), which can only happen if `allow_insecure_tls` is set
    /// in an environment without the expected TLS backend available.
    pub fn new(config: TransportConfig) -> TransportResult<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            // Some MCP servers have HTTP/2 compatibility issues; stick to HTTP/1.1.
            .http1_only();

        if config.allow_insecure_tls {
            tracing::warn!("MCP_ALLOW_INSECURE_TLS is set: disabling TLS certificate verification");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| TransportError::ConfigurationError(format!("failed to build HTTP client: {e}")))?;

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let max_concurrent = config.limits.max_concurrent_requests.min(tokio::sync::Semaphore::MAX_PERMITS);

        Ok(Self {
            config,
            http,
            connected: AtomicBool::new(false),
            closing: AtomicBool::new(false),
            session_id: RwLock::new(None),
            inbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            sse_task: Mutex::new(None),
            semaphore: Semaphore::new(max_concurrent),
        })
    }

    fn adopt_session_id(&self, headers: &reqwest::header::HeaderMap) {
        if let Some(value) = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) {
            let mut current = self.session_id.write().unwrap();
            if current.as_deref() != Some(value) {
                *current = Some(value.to_string());
                TransportEvent::new(
                    TransportEventType::SessionEstablished,
                    Some(value.to_string()),
                )
                .emit();
            }
        }
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            "application/json".parse().unwrap(),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            "application/json, text/event-stream".parse().unwrap(),
        );
        if let Some(session) = self.session_id.read().unwrap().clone() {
            if let Ok(value) = reqwest::header::HeaderValue::from_str(&session) {
                headers.insert(SESSION_HEADER, value);
            }
        }
        for (k, v) in &self.config.headers {
            if let (Ok(name), Ok(value)) = (
                reqwest::header::HeaderName::from_bytes(k.as_bytes()),
                reqwest::header::HeaderValue::from_str(v),
            ) {
                headers.insert(name, value);
            }
        }
        headers
    }

    /// Spawn (or replace) the background SSE reader for `response`.
    ///
    /// If a previous SSE reader is still running, it is cancelled before the
    /// new one starts, per the "second upgrade wins" rule in §4.1.
    async fn start_sse_stream(&self, response: reqwest::Response) {
        let mut guard = self.sse_task.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
        }

        let tx = self.inbound_tx.clone();
        let handle = tokio::spawn(async move {
            let mut buffer = String::new();
            let mut stream = response.bytes_stream();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        TransportEvent::new(TransportEventType::Error, Some(e.to_string())).emit();
                        break;
                    }
                };
                // Normalize CRLF to LF up front so the blank-line delimiter
                // search below matches servers using either line ending.
                buffer.push_str(&String::from_utf8_lossy(&chunk).replace("\r\n", "\n"));

                while let Some(pos) = buffer.find("\n\n") {
                    let event_str: String = buffer.drain(..pos + 2).collect();
                    if let Some(message) = parse_sse_event(&event_str) {
                        if tx.send(message).is_err() {
                            return;
                        }
                    }
                }
            }
            TransportEvent::new(TransportEventType::SseClosed, None).emit();
        });

        *guard = Some(handle);
        TransportEvent::new(TransportEventType::SseOpened, None).emit();
    }

    /// One POST attempt, including the concurrency permit. Split out of
    /// [`Transport::send`] so the retry loop there can call it repeatedly
    /// without re-validating connection state or re-encoding the body.
    async fn post_once(&self, body: &[u8]) -> TransportResult<Option<JsonRpcMessage>> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        TransportEvent::new(TransportEventType::MessageSent, None).emit();

        let response = self
            .http
            .post(self.config.url.clone())
            .headers(self.build_headers())
            .body(body.to_vec())
            .send()
            .await?;

        self.adopt_session_id(response.headers());

        if response.status() == reqwest::StatusCode::ACCEPTED {
            return Ok(None);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if content_type.contains("text/event-stream") {
            self.start_sse_stream(response).await;
            return Ok(None);
        }

        if response.status().is_client_error() || response.status().is_server_error() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::HttpError { status, body });
        }

        if content_type.contains("application/json") {
            if let Some(max) = self.config.limits.max_response_size {
                if let Some(declared) = response.content_length() {
                    if declared as usize > max {
                        return Err(TransportError::ReceiveFailed(format!(
                            "response size {declared} exceeds max {max}"
                        )));
                    }
                }
            }
            let bytes = response.bytes().await?;
            if let Some(max) = self.config.limits.max_response_size {
                if bytes.len() > max {
                    return Err(TransportError::ReceiveFailed(format!(
                        "response size {} exceeds max {max}",
                        bytes.len()
                    )));
                }
            }
            let msg = JsonRpcMessage::from_slice(&bytes)?;
            TransportEvent::new(TransportEventType::MessageReceived, None).emit();
            return Ok(Some(msg));
        }

        Ok(None)
    }
}

/// Parse one `\n\n`-delimited SSE event block into a decoded JSON-RPC
/// message. Returns `None` for comments, empty events, or malformed JSON —
/// the stream cursor still advances past the event either way.
fn parse_sse_event(event_str: &str) -> Option<JsonRpcMessage> {
    let mut data_lines = Vec::new();
    for line in event_str.split('\n') {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some((field, value)) = line.split_once(':') {
            let value = value.strip_prefix(' ').unwrap_or(value);
            if field == "data" {
                data_lines.push(value);
            }
        }
    }
    if data_lines.is_empty() {
        return None;
    }
    let data = data_lines.join("\n");
    match JsonRpcMessage::from_slice(data.as_bytes()) {
        Ok(msg) => Some(msg),
        Err(e) => {
            tracing::debug!(error = %e, "skipping malformed SSE data payload");
            None
        }
    }
}

#[async_trait]
impl Transport for StreamableHttpTransport {
    async fn connect(&self) -> TransportResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }
        TransportEvent::new(TransportEventType::Connecting, None).emit();
        self.connected.store(true, Ordering::SeqCst);
        self.closing.store(false, Ordering::SeqCst);
        TransportEvent::new(TransportEventType::Connected, None).emit();
        Ok(())
    }

    async fn disconnect(&self) -> TransportResult<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.closing.store(true, Ordering::SeqCst);
        TransportEvent::new(TransportEventType::Disconnecting, None).emit();

        if let Some(handle) = self.sse_task.lock().await.take() {
            handle.abort();
        }

        *self.session_id.write().unwrap() = None;
        self.connected.store(false, Ordering::SeqCst);
        TransportEvent::new(TransportEventType::Disconnected, None).emit();
        Ok(())
    }

    async fn send(&self, message: &JsonRpcMessage) -> TransportResult<Option<JsonRpcMessage>> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::SessionError("transport not connected".into()));
        }
        if self.closing.load(Ordering::SeqCst) {
            return Err(TransportError::SessionError("transport is closing".into()));
        }

        let body = serde_json::to_vec(message)?;
        if let Some(max) = self.config.limits.max_request_size {
            if body.len() > max {
                return Err(TransportError::SendFailed(format!(
                    "request size {} exceeds max {max}",
                    body.len()
                )));
            }
        }

        let mut attempt = 0;
        loop {
            match self.post_once(&body).await {
                Ok(result) => return Ok(result),
                Err(err) if err.is_retryable() => {
                    match self.config.retry.delay(attempt) {
                        Some(delay) => {
                            tracing::warn!(attempt, error = %err, delay_ms = delay.as_millis() as u64, "retrying request");
                            tokio::time::sleep(delay).await;
                            attempt += 1;
                        }
                        None => return Err(err),
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn receive(&self) -> TransportResult<JsonRpcMessage> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv()
            .await
            .ok_or_else(|| TransportError::ConnectionLost("inbound channel closed".into()))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.closing.load(Ordering::SeqCst)
    }

    fn session_id(&self) -> Option<String> {
        self.session_id.read().unwrap().clone()
    }
}
