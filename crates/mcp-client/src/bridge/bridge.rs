//! Multi-server orchestration: one [`Client`] per configured server, a
//! shared tool surface, and the feature handlers a host LLM adapter needs
//! wired before any server is let into READY.

use std::collections::HashMap;
use std::sync::Arc;

use mcp_protocol::{
    CallToolResult, ClientCapabilities, ElicitationCapability, Implementation, McpError, RootsCapability, Tool,
};
use mcp_transport::config::TransportConfig;
use mcp_transport::StreamableHttpTransport;
use tokio::sync::Mutex as AsyncMutex;

use crate::client::{Client, ClientError, RequestOptions};
use crate::config::ServerConfigEntry;
use crate::utilities::{install_cancellation_listener, install_logging_listener, install_ping_handler, install_progress_listener, CancellationTracker, LoggingHandler, ProgressTracker};

use super::callbacks::HostCallbacks;
use super::registry::ServerRegistry;

/// Everything the bridge keeps per connected server.
pub struct ConnectedServer {
    pub client: Client<StreamableHttpTransport>,
    pub progress: Arc<ProgressTracker>,
    pub cancellation: Arc<CancellationTracker>,
    pub logging: Arc<LoggingHandler>,
}

/// A single failed connection attempt, surfaced to the caller instead of
/// aborting the rest of `initialize()`.
#[derive(Debug, thiserror::Error)]
#[error("failed to connect to {url}: {source}")]
pub struct ConnectError {
    pub url: String,
    #[source]
    pub source: ClientError,
}

/// Owns a collection of per-server clients, fans out tool discovery across
/// them, and answers server-initiated requests (sampling, roots, elicitation)
/// via host-supplied callbacks.
pub struct HybridBridge {
    servers: AsyncMutex<HashMap<String, ConnectedServer>>,
    registry: Arc<ServerRegistry>,
    client_info: Implementation,
    callbacks: HostCallbacks,
}

impl HybridBridge {
    #[must_use]
    pub fn new(client_info: Implementation, callbacks: HostCallbacks) -> Self {
        Self {
            servers: AsyncMutex::new(HashMap::new()),
            registry: Arc::new(ServerRegistry::new()),
            client_info,
            callbacks,
        }
    }

    #[must_use]
    pub fn registry(&self) -> Arc<ServerRegistry> {
        self.registry.clone()
    }

    /// The progress tracker installed for the server at `url`, if connected.
    pub async fn server_progress(&self, url: &str) -> Option<Arc<ProgressTracker>> {
        self.servers.lock().await.get(url).map(|s| s.progress.clone())
    }

    /// The cancellation tracker installed for the server at `url`, if connected.
    pub async fn server_cancellation(&self, url: &str) -> Option<Arc<CancellationTracker>> {
        self.servers.lock().await.get(url).map(|s| s.cancellation.clone())
    }

    /// The remote-log handler installed for the server at `url`, if connected.
    pub async fn server_logging(&self, url: &str) -> Option<Arc<LoggingHandler>> {
        self.servers.lock().await.get(url).map(|s| s.logging.clone())
    }

    /// A connected, clonable client for the server at `url`, if any — the
    /// escape hatch for operations the bridge does not wrap directly
    /// (resources, prompts, completion, task augmentation).
    pub async fn server_client(&self, url: &str) -> Option<Client<StreamableHttpTransport>> {
        self.servers.lock().await.get(url).map(|s| s.client.clone())
    }

    fn client_capabilities(&self) -> ClientCapabilities {
        ClientCapabilities {
            sampling: self.callbacks.sampling.is_some().then(serde_json::Map::new),
            roots: self
                .callbacks
                .roots_list
                .is_some()
                .then_some(RootsCapability { list_changed: true }),
            elicitation: self
                .callbacks
                .elicitation
                .is_some()
                .then_some(ElicitationCapability { form: true, url: false }),
            ..ClientCapabilities::default()
        }
    }

    /// Connect to every configured server in turn. A failure on one server
    /// is logged and recorded in the returned error list; it does not stop
    /// the remaining servers from being attempted.
    #[tracing::instrument(skip_all, fields(server_count = configs.len()))]
    pub async fn initialize(&self, configs: &[ServerConfigEntry]) -> Vec<ConnectError> {
        let mut failures = Vec::new();
        for config in configs {
            if let Err(source) = self.connect_one(config).await {
                tracing::warn!(server = %config.name, url = %config.url, error = %source, "failed to connect to server");
                failures.push(ConnectError {
                    url: config.url.clone(),
                    source,
                });
            }
        }
        failures
    }

    async fn connect_one(&self, config: &ServerConfigEntry) -> Result<(), ClientError> {
        let transport_config = TransportConfig::new(&config.url, config.headers.clone())?;
        let transport = StreamableHttpTransport::new(transport_config)?;
        let client = Client::new(transport);

        self.install_feature_handlers(&client);
        let progress = Arc::new(ProgressTracker::default());
        let cancellation = Arc::new(CancellationTracker::default());
        let logging = Arc::new(LoggingHandler::new(mcp_protocol::LogLevel::Info, config.name.clone()));
        install_progress_listener(&client, progress.clone());
        install_cancellation_listener(&client, cancellation.clone());
        install_logging_listener(&client, logging.clone());
        install_ping_handler(&client);

        client.connect().await?;
        let negotiation = client.initialize(self.client_info.clone(), self.client_capabilities()).await?;

        self.registry.record_connected(
            &config.url,
            &negotiation.server_info,
            negotiation.server_capabilities.clone(),
            negotiation.protocol_version.clone(),
        );

        self.servers.lock().await.insert(
            config.url.clone(),
            ConnectedServer {
                client,
                progress,
                cancellation,
                logging,
            },
        );
        Ok(())
    }

    /// Register handlers for the server-initiated methods this bridge
    /// declared support for via `client_capabilities()`.
    fn install_feature_handlers(&self, client: &Client<StreamableHttpTransport>) {
        if let Some(sampling) = self.callbacks.sampling.clone() {
            client.on_request(
                "sampling/createMessage",
                Arc::new(move |params| {
                    let sampling = sampling.clone();
                    Box::pin(async move {
                        let value = params.unwrap_or(serde_json::Value::Null);
                        match sampling(value).await {
                            Ok(result) => Ok(result),
                            Err(_reason) => Err(McpError::sampling_denied()),
                        }
                    })
                }),
            );
        }

        if let Some(elicitation) = self.callbacks.elicitation.clone() {
            client.on_request(
                "elicitation/create",
                Arc::new(move |params| {
                    let elicitation = elicitation.clone();
                    Box::pin(async move {
                        let value = params.unwrap_or(serde_json::Value::Null);
                        elicitation(value).await.map_err(McpError::invalid_request)
                    })
                }),
            );
        }

        if let Some(roots_list) = self.callbacks.roots_list.clone() {
            client.on_request(
                "roots/list",
                Arc::new(move |_params| {
                    let roots_list = roots_list.clone();
                    Box::pin(async move {
                        let roots = roots_list().await;
                        Ok(serde_json::json!({ "roots": roots }))
                    })
                }),
            );
        }
    }

    /// Disconnect every server and clear registry state. Idempotent and
    /// safe to call more than once concurrently.
    pub async fn shutdown(&self) {
        let mut servers = self.servers.lock().await;
        for (url, server) in servers.drain() {
            if let Err(err) = server.client.close().await {
                tracing::warn!(url = %url, error = %err, "error while disconnecting server");
            }
            self.registry.record_disconnected(&url);
        }
        self.registry.clear();
    }

    /// Fan out `tools/list` across every connected server that advertises
    /// the tools capability, tagging each `Tool` with its owning server URL.
    ///
    /// Clients are cheap to clone (`Arc`-backed), so the per-server fetches
    /// run concurrently without holding the connection-map lock for the
    /// duration of any network call.
    #[tracing::instrument(skip(self))]
    pub async fn list_all_tools(&self) -> Vec<Tool> {
        let targets: Vec<(String, Client<StreamableHttpTransport>)> = {
            let servers = self.servers.lock().await;
            servers
                .iter()
                .filter(|(url, _)| {
                    self.registry
                        .get(url)
                        .is_some_and(|info| info.capabilities.tools.is_some())
                })
                .map(|(url, server)| (url.clone(), server.client.clone()))
                .collect()
        };

        let fetches = targets.into_iter().map(|(url, client)| async move {
            match crate::utilities::list_all_tools(&client).await {
                Ok(mut fetched) => {
                    for tool in &mut fetched {
                        tool.server_url = Some(url.clone());
                    }
                    fetched
                }
                Err(err) => {
                    tracing::warn!(url = %url, error = %err, "tools/list failed");
                    Vec::new()
                }
            }
        });

        futures::future::join_all(fetches).await.into_iter().flatten().collect()
    }

    /// Call a tool on the server that owns it.
    ///
    /// # Errors
    /// Returns [`McpError::invalid_params`] if no connected server matches
    /// `server_url`; otherwise the underlying `tools/call` error.
    pub async fn call_tool(
        &self,
        server_url: &str,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult, McpError> {
        let client = {
            let servers = self.servers.lock().await;
            servers
                .get(server_url)
                .map(|server| server.client.clone())
                .ok_or_else(|| McpError::invalid_params(format!("no connected server for {server_url}")))?
        };

        let result = client
            .request(
                "tools/call",
                Some(serde_json::json!({ "name": name, "arguments": arguments })),
                RequestOptions::default(),
            )
            .await
            .map_err(McpError::from)?;

        serde_json::from_value(result).map_err(|e| McpError::parse_error(e.to_string()))
    }

    /// Build one async callable per aggregated tool, each routing back to
    /// [`HybridBridge::call_tool`] against the tool's owning server.
    pub async fn create_tool_callables(self: &Arc<Self>) -> HashMap<String, ToolCallable> {
        let tools = self.list_all_tools().await;
        let mut callables = HashMap::new();
        for tool in tools {
            let Some(server_url) = tool.server_url.clone() else { continue };
            let bridge = self.clone();
            let name = tool.name.clone();
            let callable: ToolCallable = Arc::new(move |arguments: serde_json::Value| {
                let bridge = bridge.clone();
                let server_url = server_url.clone();
                let name = name.clone();
                Box::pin(async move {
                    let result = bridge.call_tool(&server_url, &name, arguments).await?;
                    Ok(result.text())
                })
            });
            callables.insert(tool.name.clone(), callable);
        }
        callables
    }
}

/// A synthesized per-tool callable, routing back through the owning
/// server's client. Returned by [`HybridBridge::create_tool_callables`].
pub type ToolCallable =
    Arc<dyn Fn(serde_json::Value) -> futures::future::BoxFuture<'static, Result<String, McpError>> + Send + Sync>;
