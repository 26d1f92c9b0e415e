//! Protocol lifecycle state machine shared by the client and its callers.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProtocolState {
    Disconnected = 0,
    Connecting = 1,
    Initializing = 2,
    Ready = 3,
    Closing = 4,
    Closed = 5,
}

impl ProtocolState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Disconnected,
            1 => Self::Connecting,
            2 => Self::Initializing,
            3 => Self::Ready,
            4 => Self::Closing,
            _ => Self::Closed,
        }
    }

    fn can_transition_to(self, next: Self) -> bool {
        use ProtocolState::{Closed, Closing, Connecting, Disconnected, Initializing, Ready};
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Initializing)
                | (Connecting, Disconnected)
                | (Initializing, Ready)
                | (Initializing, Disconnected)
                | (Ready, Closing)
                | (Ready, Disconnected)
                | (Closing, Closed)
                | (Closing, Disconnected)
        )
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid protocol state transition: {from:?} -> {to:?}")]
pub struct InvalidStateTransition {
    pub from: ProtocolState,
    pub to: ProtocolState,
}

/// Thread-safe holder for the client's lifecycle state.
///
/// Transition listeners are intentionally not modeled here (unlike the
/// source's `on_transition` callback list) — this crate routes state changes
/// through the places that need to react (the receive loop, `close()`)
/// directly rather than through a general observer list.
pub struct StateMachine {
    state: AtomicU8,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ProtocolState::Disconnected as u8),
        }
    }

    #[must_use]
    pub fn current(&self) -> ProtocolState {
        ProtocolState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Validate and apply `next`.
    ///
    /// # Errors
    /// Returns [`InvalidStateTransition`] if the edge is not permitted.
    pub fn transition(&self, next: ProtocolState) -> Result<(), InvalidStateTransition> {
        let current = self.current();
        if !current.can_transition_to(next) {
            return Err(InvalidStateTransition {
                from: current,
                to: next,
            });
        }
        self.state.store(next as u8, Ordering::SeqCst);
        Ok(())
    }

    /// Escape hatch for error recovery: apply `next` unconditionally.
    ///
    /// Used when the transport reports an unrecoverable failure mid-flight
    /// and the caller needs to force the machine back to `Disconnected`
    /// regardless of the current state.
    pub fn force(&self, next: ProtocolState) {
        self.state.store(next as u8, Ordering::SeqCst);
    }
}
