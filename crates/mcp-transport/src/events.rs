//! Observability events emitted by the transport. Purely informational —
//! nothing in the client depends on receiving them.

use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEventType {
    Connecting,
    Connected,
    Disconnecting,
    Disconnected,
    MessageSent,
    MessageReceived,
    SseOpened,
    SseClosed,
    SessionEstablished,
    Error,
}

#[derive(Debug, Clone)]
pub struct TransportEvent {
    pub kind: TransportEventType,
    pub timestamp: SystemTime,
    pub detail: Option<String>,
}

impl TransportEvent {
    #[must_use]
    pub fn new(kind: TransportEventType, detail: Option<String>) -> Self {
        Self {
            kind,
            timestamp: SystemTime::now(),
            detail,
        }
    }

    pub(crate) fn emit(self) {
        match self.kind {
            TransportEventType::Error => {
                tracing::warn!(event = ?self.kind, detail = ?self.detail, "transport event");
            }
            _ => {
                tracing::debug!(event = ?self.kind, detail = ?self.detail, "transport event");
            }
        }
    }
}

pub type TransportEventSender = tokio::sync::mpsc::UnboundedSender<TransportEvent>;
pub type TransportEventReceiver = tokio::sync::mpsc::UnboundedReceiver<TransportEvent>;
