//! Server-facing `tasks/*` RPC surface.

use std::sync::Arc;

use mcp_protocol::McpError;
use serde_json::Value;
use uuid::Uuid;

use super::manager::TaskManager;

/// Wires `tasks/list`, `tasks/get`, `tasks/cancel` onto a [`TaskManager`].
///
/// Register these with [`crate::handlers::HandlerRegistry`] via
/// `on_request("tasks/list", ...)` etc.; this type owns only the
/// params-parsing and manager-call glue, not the handler registration.
pub struct TasksHandler {
    manager: Arc<TaskManager>,
}

impl TasksHandler {
    #[must_use]
    pub fn new(manager: Arc<TaskManager>) -> Self {
        Self { manager }
    }

    /// # Errors
    /// Invalid `state`/`type` filter values raise `INVALID_PARAMS`.
    pub fn list(&self, params: Option<Value>) -> Result<Value, McpError> {
        let (state, task_type) = parse_list_filters(params)?;
        let tasks = self.manager.list(state, task_type);
        Ok(serde_json::json!({ "tasks": tasks }))
    }

    /// # Errors
    /// `INVALID_PARAMS` for a malformed/missing `taskId`; `INVALID_PARAMS`
    /// if the task does not exist.
    pub fn get(&self, params: Option<Value>) -> Result<Value, McpError> {
        let id = parse_task_id(params)?;
        let task = self
            .manager
            .get(id)
            .ok_or_else(|| McpError::invalid_params(format!("task not found: {id}")))?;
        serde_json::to_value(task).map_err(|e| McpError::internal_error(e.to_string()))
    }

    /// # Errors
    /// `INVALID_PARAMS` for a malformed `taskId`; the manager's own
    /// not-found/not-cancellable errors otherwise.
    pub async fn cancel(&self, params: Option<Value>) -> Result<Value, McpError> {
        let id = parse_task_id(params.clone())?;
        let reason = params
            .as_ref()
            .and_then(|p| p.get("reason"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let task = self
            .manager
            .cancel_task(id, reason)
            .await
            .map_err(McpError::from)?;
        serde_json::to_value(task).map_err(|e| McpError::internal_error(e.to_string()))
    }
}

fn parse_task_id(params: Option<Value>) -> Result<Uuid, McpError> {
    let raw = params
        .as_ref()
        .and_then(|p| p.get("taskId"))
        .and_then(Value::as_str)
        .ok_or_else(|| McpError::invalid_params("missing required field: taskId"))?;
    Uuid::parse_str(raw).map_err(|e| McpError::invalid_params(format!("malformed taskId: {e}")))
}

fn parse_list_filters(
    params: Option<Value>,
) -> Result<(Option<mcp_protocol::TaskState>, Option<mcp_protocol::TaskType>), McpError> {
    let Some(params) = params else {
        return Ok((None, None));
    };
    let state = match params.get("state") {
        Some(v) => Some(
            serde_json::from_value(v.clone())
                .map_err(|e| McpError::invalid_params(format!("invalid state filter: {e}")))?,
        ),
        None => None,
    };
    let task_type = match params.get("type") {
        Some(v) => Some(
            serde_json::from_value(v.clone())
                .map_err(|e| McpError::invalid_params(format!("invalid type filter: {e}")))?,
        ),
        None => None,
    };
    Ok((state, task_type))
}
