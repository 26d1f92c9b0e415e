//! Utility layers keyed off MCP method names: ping, progress, cancellation,
//! logging, completion, and cursor pagination.

pub mod cancellation;
pub mod completion;
pub mod logging;
pub mod pagination;
pub mod ping;
pub mod progress;

pub use cancellation::{cancel_server_request, install_cancellation_listener, CancellationTracker};
pub use completion::{complete_prompt_argument, complete_resource_argument};
pub use logging::{install_logging_listener, set_log_level, LoggingHandler};
pub use pagination::{
    iter_prompts, iter_resource_pages, iter_resources, iter_tool_pages, iter_tools, list_all_prompts,
    list_all_resource_templates, list_all_resources, list_all_tools, PaginationError,
};
pub use ping::{install_ping_handler, ping_server, ping_with_retry};
pub use progress::{install_progress_listener, ProgressTracker};
