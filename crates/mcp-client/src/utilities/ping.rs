//! `ping` request/response handling.

use std::time::Duration;

use mcp_transport::Transport;

use crate::client::{Client, ClientError, RequestOptions};

/// Register the inbound `ping` responder (`{}` reply) on `client`.
pub fn install_ping_handler<T: Transport + 'static>(client: &Client<T>) {
    client.on_request(
        "ping",
        std::sync::Arc::new(|_params| {
            Box::pin(async { Ok::<_, mcp_protocol::McpError>(serde_json::json!({})) })
        }),
    );
}

/// # Errors
/// Propagates `request()` failures, including timeout.
pub async fn ping_server<T: Transport + 'static>(
    client: &Client<T>,
    timeout: Duration,
) -> Result<(), ClientError> {
    client
        .request("ping", None, RequestOptions { timeout: Some(timeout) })
        .await?;
    Ok(())
}

/// Retry `ping_server` up to `retries` additional times, sleeping `delay`
/// between attempts.
///
/// # Errors
/// The last attempt's error, if all attempts fail.
pub async fn ping_with_retry<T: Transport + 'static>(
    client: &Client<T>,
    timeout: Duration,
    retries: usize,
    delay: Duration,
) -> Result<(), ClientError> {
    let mut last_err = None;
    for attempt in 0..=retries {
        match ping_server(client, timeout).await {
            Ok(()) => return Ok(()),
            Err(err) => {
                tracing::debug!(attempt, error = %err, "ping attempt failed");
                last_err = Some(err);
                if attempt < retries {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    Err(last_err.expect("loop runs at least once"))
}
