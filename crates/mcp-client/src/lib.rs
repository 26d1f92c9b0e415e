//! Client-side core of a Model Context Protocol (2025-11-25) implementation:
//! the JSON-RPC protocol engine, capability negotiation, the task subsystem,
//! utility layers, and the multi-server bridge.
//!
//! Transport wire handling lives in `mcp-transport`; message/type
//! definitions live in `mcp-protocol`. This crate wires them together into
//! something a host application drives directly.

pub mod bridge;
pub mod client;
pub mod config;
pub mod handlers;
pub mod roots;
pub mod state;
pub mod tasks;
pub mod utilities;

pub use bridge::{ConnectError, HybridBridge, HostCallbacks, ServerInfo, ServerRegistry, ToolCallable};
pub use client::{CapabilityNegotiator, Client, ClientError, IncompatibleProtocolError, RequestOptions};
pub use config::{ConfigError, ServerConfigEntry};
pub use handlers::{HandlerRegistry, NotificationHandler, RequestHandler};
pub use roots::{RootsLockedError, RootsManager};
pub use state::{InvalidStateTransition, ProtocolState, StateMachine};
pub use tasks::{
    call_as_task, create_as_task, create_message_as_task, poll_task_until_complete, TaskExecutor, TaskManager,
    TaskManagerConfig, TaskPersistence, TasksError, TasksHandler,
};
pub use utilities::{
    cancel_server_request, complete_prompt_argument, complete_resource_argument, install_cancellation_listener,
    install_logging_listener, install_ping_handler, install_progress_listener, iter_prompts, iter_resource_pages,
    iter_resources, iter_tool_pages, iter_tools, list_all_prompts, list_all_resource_templates,
    list_all_resources, list_all_tools, ping_server, ping_with_retry, set_log_level, CancellationTracker,
    LoggingHandler, PaginationError, ProgressTracker,
};
