//! Polling fallback for servers that do not push task updates.

use std::time::Duration;

use mcp_protocol::Task;
use mcp_transport::Transport;
use uuid::Uuid;

use crate::client::{Client, ClientError, RequestOptions};

/// Poll `tasks/get` for `task_id` at `interval` until it reaches a terminal
/// state or `timeout` elapses.
///
/// # Errors
/// [`ClientError::Timeout`] if the task is still active when `timeout`
/// elapses; any `request()` error from the underlying `tasks/get` call.
pub async fn poll_task_until_complete<T: Transport + 'static>(
    client: &Client<T>,
    task_id: Uuid,
    interval: Duration,
    timeout: Duration,
) -> Result<Task, ClientError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let value = client
            .request(
                "tasks/get",
                Some(serde_json::json!({ "taskId": task_id.to_string() })),
                RequestOptions {
                    timeout: Some(interval.max(Duration::from_secs(1))),
                },
            )
            .await?;
        let task: Task = serde_json::from_value(value)?;
        if task.state.is_terminal() {
            return Ok(task);
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(ClientError::Timeout(timeout));
        }
        tokio::time::sleep(interval).await;
    }
}
