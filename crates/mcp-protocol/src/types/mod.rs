pub mod cancellation;
pub mod completion;
pub mod content;
pub mod initialization;
pub mod logging;
pub mod pagination;
pub mod progress;
pub mod prompts;
pub mod resources;
pub mod roots;
pub mod tasks;
pub mod tools;

pub use cancellation::CancellationInfo;
pub use completion::{CompletionArgument, CompletionRef, CompletionRefType, CompletionRequest, CompletionResponse};
pub use content::{CallToolResult, ContentBlock};
pub use initialization::{
    supported_protocol_versions, ClientCapabilities, ElicitationCapability, Implementation,
    InitializeRequestParams, InitializeResult, ListChangedCapability, NegotiationResult,
    ResourcesCapability, RootsCapability, ServerCapabilities, TasksCapability, PROTOCOL_VERSION,
};
pub use logging::{LogLevel, LogMessage};
pub use pagination::PaginatedResult;
pub use progress::{ProgressInfo, ProgressToken};
pub use prompts::{Prompt, PromptArgument};
pub use resources::{Resource, ResourceTemplate};
pub use roots::Root;
pub use tasks::{InvalidTaskTransition, Task, TaskError, TaskProgress, TaskState, TaskType};
pub use tools::Tool;
