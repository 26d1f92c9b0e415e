//! Errors raised by the task subsystem's server-facing RPC surface.

use uuid::Uuid;

#[derive(Debug, Clone, thiserror::Error)]
pub enum TasksError {
    #[error("too many active tasks (limit {limit})")]
    TooManyTasks { limit: usize },
    #[error("task not found: {0}")]
    TaskNotFound(Uuid),
    #[error("task {id} is not cancellable in state {state:?}")]
    TaskNotCancellable {
        id: Uuid,
        state: mcp_protocol::TaskState,
    },
}

impl From<TasksError> for mcp_protocol::McpError {
    fn from(err: TasksError) -> Self {
        match &err {
            TasksError::TooManyTasks { .. } => {
                mcp_protocol::McpError::internal_error(err.to_string())
            }
            TasksError::TaskNotFound(_) => mcp_protocol::McpError::invalid_params(err.to_string()),
            TasksError::TaskNotCancellable { .. } => {
                mcp_protocol::McpError::invalid_request(err.to_string())
            }
        }
    }
}
