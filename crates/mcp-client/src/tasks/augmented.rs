//! Task-augmented wrappers: lift a sampling/elicitation/tool-call request
//! into a durable, pollable [`Task`] instead of awaiting it inline.

use std::sync::Arc;
use std::time::Duration;

use mcp_protocol::{McpError, Task, TaskError, TaskType};
use mcp_transport::Transport;
use serde_json::{Map, Value};

use crate::client::{Client, RequestOptions};

use super::errors::TasksError;
use super::manager::TaskManager;

fn request_executor<T: Transport + 'static>(
    client: Client<T>,
    method: &'static str,
    params: Option<Value>,
    timeout: Duration,
) -> Box<dyn FnOnce() -> futures::future::BoxFuture<'static, Result<Value, TaskError>> + Send> {
    Box::new(move || {
        Box::pin(async move {
            client
                .request(method, params, RequestOptions { timeout: Some(timeout) })
                .await
                .map_err(|e| TaskError::from(McpError::from(e)))
        })
    })
}

/// Hand a `sampling/createMessage` call to the task manager instead of
/// awaiting it inline.
///
/// # Errors
/// [`TasksError::TooManyTasks`] if the manager is at capacity.
pub async fn create_message_as_task<T: Transport + 'static>(
    manager: &TaskManager,
    client: Client<T>,
    params: Value,
    timeout: Duration,
) -> Result<Task, TasksError> {
    let executor = request_executor(client, "sampling/createMessage", Some(params), timeout);
    manager
        .create_task(TaskType::SamplingCreateMessage, Map::new(), Some(timeout), executor)
        .await
}

/// Hand an `elicitation/create` call to the task manager.
///
/// # Errors
/// [`TasksError::TooManyTasks`] if the manager is at capacity.
pub async fn create_as_task<T: Transport + 'static>(
    manager: &TaskManager,
    client: Client<T>,
    params: Value,
    timeout: Duration,
) -> Result<Task, TasksError> {
    let executor = request_executor(client, "elicitation/create", Some(params), timeout);
    manager
        .create_task(TaskType::ElicitationCreate, Map::new(), Some(timeout), executor)
        .await
}

/// Hand a `tools/call` invocation to the task manager.
///
/// # Errors
/// [`TasksError::TooManyTasks`] if the manager is at capacity.
pub async fn call_as_task<T: Transport + 'static>(
    manager: &TaskManager,
    client: Client<T>,
    tool_name: impl Into<String>,
    arguments: Value,
    timeout: Duration,
) -> Result<Task, TasksError> {
    let params = serde_json::json!({ "name": tool_name.into(), "arguments": arguments });
    let mut metadata = Map::new();
    metadata.insert("tool".into(), params["name"].clone());
    let executor = request_executor(client, "tools/call", Some(params), timeout);
    manager
        .create_task(TaskType::ToolsCall, metadata, Some(timeout), executor)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::manager::TaskManagerConfig;
    use async_trait::async_trait;
    use mcp_protocol::{JsonRpcMessage, JsonRpcResponse};
    use mcp_transport::TransportResult;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct StubTransport {
        connected: AtomicBool,
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn connect(&self) -> TransportResult<()> {
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        }
        async fn disconnect(&self) -> TransportResult<()> {
            Ok(())
        }
        async fn send(&self, message: &JsonRpcMessage) -> TransportResult<Option<JsonRpcMessage>> {
            if let JsonRpcMessage::Request(req) = message {
                return Ok(Some(JsonRpcMessage::Response(JsonRpcResponse::success(
                    req.id.clone(),
                    serde_json::json!({ "content": [] }),
                ))));
            }
            Ok(None)
        }
        async fn receive(&self) -> TransportResult<JsonRpcMessage> {
            std::future::pending().await
        }
        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }
        fn session_id(&self) -> Option<String> {
            None
        }
    }

    #[tokio::test]
    async fn call_as_task_completes_with_tool_result() {
        let transport = StubTransport {
            connected: AtomicBool::new(false),
        };
        let client = Client::new(transport);
        client.connect().await.unwrap();

        let manager = Arc::new(TaskManager::new(TaskManagerConfig::default(), None));
        let task = call_as_task(
            &manager,
            client,
            "echo",
            serde_json::json!({"text": "hi"}),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        let updated = manager.get(task.id).unwrap();
        assert_eq!(updated.state, mcp_protocol::TaskState::Completed);
        assert_eq!(updated.metadata["tool"], "echo");
    }
}
