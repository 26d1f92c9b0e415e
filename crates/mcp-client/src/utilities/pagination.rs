//! Cursor-based pagination driver over the `*/list` methods.

use futures::stream::{self, Stream, StreamExt};
use mcp_protocol::{ErrorCode, PaginatedResult, Prompt, Resource, ResourceTemplate, Tool};
use mcp_transport::Transport;
use serde::de::DeserializeOwned;

use crate::client::{Client, ClientError, RequestOptions};

const DEFAULT_MAX_PAGES: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum PaginationError {
    #[error("server rejected the pagination cursor")]
    InvalidCursor,
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl PaginationError {
    fn from_client_error(err: ClientError) -> Self {
        if let ClientError::Protocol(ref mcp_err) = err {
            if mcp_err.error_code() == ErrorCode::InvalidParams {
                return Self::InvalidCursor;
            }
        }
        Self::Client(err)
    }
}

async fn fetch_page<T: DeserializeOwned, U: Transport + 'static>(
    client: &Client<U>,
    method: &str,
    items_key: &str,
    cursor: Option<String>,
) -> Result<PaginatedResult<T>, PaginationError> {
    let params = cursor.map(|c| serde_json::json!({ "cursor": c }));
    let value = client
        .request(method, params, RequestOptions::default())
        .await
        .map_err(PaginationError::from_client_error)?;

    let items_value = value.get(items_key).cloned().unwrap_or(serde_json::json!([]));
    let items: Vec<T> = serde_json::from_value(items_value)
        .map_err(|e| PaginationError::Client(ClientError::from(e)))?;
    let next_cursor = value
        .get("nextCursor")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string);

    Ok(PaginatedResult { items, next_cursor })
}

/// Walk the cursor chain for `method`, collecting every page's items up to
/// `max_pages`. Logs (rather than silently truncating) if the safety limit
/// is reached while more pages remain.
async fn list_all<T: DeserializeOwned, U: Transport + 'static>(
    client: &Client<U>,
    method: &str,
    items_key: &str,
) -> Result<Vec<T>, PaginationError> {
    let mut items = Vec::new();
    let mut cursor = None;
    for page in 0..DEFAULT_MAX_PAGES {
        let result = fetch_page::<T, U>(client, method, items_key, cursor).await?;
        items.extend(result.items);
        match result.next_cursor {
            Some(next) => cursor = Some(next),
            None => return Ok(items),
        }
        if page == DEFAULT_MAX_PAGES - 1 {
            tracing::warn!(method, max_pages = DEFAULT_MAX_PAGES, "pagination safety limit reached with more pages remaining");
        }
    }
    Ok(items)
}

/// # Errors
/// [`PaginationError::InvalidCursor`] if the server rejects a cursor;
/// otherwise the underlying transport/protocol error.
pub async fn list_all_tools<U: Transport + 'static>(client: &Client<U>) -> Result<Vec<Tool>, PaginationError> {
    list_all(client, "tools/list", "tools").await
}

/// # Errors
/// See [`list_all_tools`].
pub async fn list_all_resources<U: Transport + 'static>(
    client: &Client<U>,
) -> Result<Vec<Resource>, PaginationError> {
    list_all(client, "resources/list", "resources").await
}

/// # Errors
/// See [`list_all_tools`].
pub async fn list_all_resource_templates<U: Transport + 'static>(
    client: &Client<U>,
) -> Result<Vec<ResourceTemplate>, PaginationError> {
    list_all(client, "resources/templates/list", "resourceTemplates").await
}

/// # Errors
/// See [`list_all_tools`].
pub async fn list_all_prompts<U: Transport + 'static>(client: &Client<U>) -> Result<Vec<Prompt>, PaginationError> {
    list_all(client, "prompts/list", "prompts").await
}

/// Stream one page at a time for `method`, following `nextCursor` until the
/// server stops returning one. Unlike [`list_all`], nothing is buffered
/// beyond the page currently in flight — a caller that only needs the first
/// few pages can drop the stream early without paying for the rest.
fn iter_pages<T, U>(
    client: &Client<U>,
    method: &'static str,
    items_key: &'static str,
) -> impl Stream<Item = Result<PaginatedResult<T>, PaginationError>> + '_
where
    T: DeserializeOwned,
    U: Transport + 'static,
{
    stream::unfold(Some(None), move |cursor| async move {
        let cursor = cursor?;
        match fetch_page::<T, U>(client, method, items_key, cursor).await {
            Ok(result) => {
                let next_state = result.next_cursor.clone().map(Some);
                Some((Ok(result), next_state))
            }
            Err(err) => Some((Err(err), None)),
        }
    })
}

/// Flatten [`iter_pages`] into a stream of individual items, surfacing the
/// page-level error (if any) as the final element before the stream ends.
fn iter_items<T, U>(
    client: &Client<U>,
    method: &'static str,
    items_key: &'static str,
) -> impl Stream<Item = Result<T, PaginationError>> + '_
where
    T: DeserializeOwned,
    U: Transport + 'static,
{
    iter_pages(client, method, items_key).flat_map(|page| match page {
        Ok(result) => stream::iter(result.items.into_iter().map(Ok).collect::<Vec<_>>()),
        Err(err) => stream::iter(vec![Err(err)]),
    })
}

/// Stream `tools/list` pages one at a time instead of buffering every page
/// up front the way [`list_all_tools`] does.
pub fn iter_tool_pages<U: Transport + 'static>(
    client: &Client<U>,
) -> impl Stream<Item = Result<PaginatedResult<Tool>, PaginationError>> + '_ {
    iter_pages(client, "tools/list", "tools")
}

/// Stream individual tools across every `tools/list` page.
pub fn iter_tools<U: Transport + 'static>(
    client: &Client<U>,
) -> impl Stream<Item = Result<Tool, PaginationError>> + '_ {
    iter_items(client, "tools/list", "tools")
}

/// Stream `resources/list` pages one at a time.
pub fn iter_resource_pages<U: Transport + 'static>(
    client: &Client<U>,
) -> impl Stream<Item = Result<PaginatedResult<Resource>, PaginationError>> + '_ {
    iter_pages(client, "resources/list", "resources")
}

/// Stream individual resources across every `resources/list` page.
pub fn iter_resources<U: Transport + 'static>(
    client: &Client<U>,
) -> impl Stream<Item = Result<Resource, PaginationError>> + '_ {
    iter_items(client, "resources/list", "resources")
}

/// Stream individual prompts across every `prompts/list` page.
pub fn iter_prompts<U: Transport + 'static>(
    client: &Client<U>,
) -> impl Stream<Item = Result<Prompt, PaginationError>> + '_ {
    iter_items(client, "prompts/list", "prompts")
}
