//! Host-supplied callbacks for server-initiated requests.
//!
//! The concrete LLM SDK and host UI are external collaborators; the bridge
//! only needs narrow async callback interfaces to drive them.

use std::sync::Arc;

use futures::future::BoxFuture;
use mcp_protocol::Root;
use serde_json::Value;

pub type SamplingCallback = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, String>> + Send + Sync>;
pub type ElicitationCallback = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, String>> + Send + Sync>;
pub type RootsListCallback = Arc<dyn Fn() -> BoxFuture<'static, Vec<Root>> + Send + Sync>;

/// Host integration points named in the external-interfaces section: the
/// approval/form callbacks for sampling and elicitation, and the roots
/// snapshot provider. Any of the three may be absent, in which case the
/// bridge declares the corresponding capability as unsupported and denies
/// inbound requests for it.
#[derive(Clone, Default)]
pub struct HostCallbacks {
    pub sampling: Option<SamplingCallback>,
    pub elicitation: Option<ElicitationCallback>,
    pub roots_list: Option<RootsListCallback>,
}
