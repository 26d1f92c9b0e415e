//! Multi-server orchestration: connection management, capability fan-out,
//! and the callback seams for server-initiated requests.

pub mod bridge;
pub mod callbacks;
pub mod registry;

pub use bridge::{ConnectError, ConnectedServer, HybridBridge, ToolCallable};
pub use callbacks::{ElicitationCallback, HostCallbacks, RootsListCallback, SamplingCallback};
pub use registry::{ServerInfo, ServerRegistry};
