//! Outbound `completion/complete` convenience functions.

use mcp_protocol::{CompletionArgument, CompletionRef, CompletionRefType, CompletionRequest, CompletionResponse};
use mcp_transport::Transport;

use crate::client::{Client, ClientError, RequestOptions};

async fn complete<T: Transport + 'static>(
    client: &Client<T>,
    reference: CompletionRef,
    argument: CompletionArgument,
) -> Result<CompletionResponse, ClientError> {
    let request = CompletionRequest {
        reference,
        argument,
        context: None,
    };
    let value = client
        .request(
            "completion/complete",
            Some(serde_json::to_value(request)?),
            RequestOptions::default(),
        )
        .await?;
    Ok(serde_json::from_value(value)?)
}

/// Request completion suggestions for a prompt argument.
///
/// # Errors
/// Propagates `request()` failures, including `CAPABILITY_NOT_SUPPORTED`
/// if the server never advertised `completions`.
pub async fn complete_prompt_argument<T: Transport + 'static>(
    client: &Client<T>,
    prompt_name: impl Into<String>,
    argument_name: impl Into<String>,
    argument_value: impl Into<String>,
) -> Result<CompletionResponse, ClientError> {
    complete(
        client,
        CompletionRef {
            ref_type: CompletionRefType::Prompt,
            name: prompt_name.into(),
        },
        CompletionArgument {
            name: argument_name.into(),
            value: argument_value.into(),
        },
    )
    .await
}

/// Request completion suggestions for a resource URI template argument.
///
/// # Errors
/// Propagates `request()` failures.
pub async fn complete_resource_argument<T: Transport + 'static>(
    client: &Client<T>,
    resource_uri: impl Into<String>,
    argument_name: impl Into<String>,
    argument_value: impl Into<String>,
) -> Result<CompletionResponse, ClientError> {
    complete(
        client,
        CompletionRef {
            ref_type: CompletionRefType::Resource,
            name: resource_uri.into(),
        },
        CompletionArgument {
            name: argument_name.into(),
            value: argument_value.into(),
        },
    )
    .await
}
