//! The per-server protocol engine: `Client<T>`.

mod core;
pub mod negotiation;
pub mod pending;

pub use core::{Client, ClientError, RequestOptions};
pub use negotiation::{CapabilityNegotiator, IncompatibleProtocolError};
pub use pending::PendingRequestTable;
