//! Read-only view of connected servers, mirroring client connect/disconnect.

use std::collections::HashMap;

use mcp_protocol::{Implementation, ServerCapabilities};
use parking_lot::RwLock;

#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub url: String,
    pub name: String,
    pub version: String,
    pub capabilities: ServerCapabilities,
    pub connected: bool,
    pub protocol_version: String,
}

#[derive(Default)]
pub struct ServerRegistry {
    servers: RwLock<HashMap<String, ServerInfo>>,
}

impl ServerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connected(
        &self,
        url: impl Into<String>,
        server_info: &Implementation,
        capabilities: ServerCapabilities,
        protocol_version: impl Into<String>,
    ) {
        let url = url.into();
        self.servers.write().insert(
            url.clone(),
            ServerInfo {
                url,
                name: server_info.name.clone(),
                version: server_info.version.clone(),
                capabilities,
                connected: true,
                protocol_version: protocol_version.into(),
            },
        );
    }

    pub fn record_disconnected(&self, url: &str) {
        if let Some(info) = self.servers.write().get_mut(url) {
            info.connected = false;
        }
    }

    pub fn clear(&self) {
        self.servers.write().clear();
    }

    #[must_use]
    pub fn get(&self, url: &str) -> Option<ServerInfo> {
        self.servers.read().get(url).cloned()
    }

    #[must_use]
    pub fn all(&self) -> Vec<ServerInfo> {
        self.servers.read().values().cloned().collect()
    }

    #[must_use]
    pub fn connected_urls(&self) -> Vec<String> {
        self.servers
            .read()
            .values()
            .filter(|s| s.connected)
            .map(|s| s.url.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_implementation() -> Implementation {
        Implementation {
            name: "test-server".into(),
            version: "1.0.0".into(),
            title: None,
        }
    }

    #[test]
    fn disconnect_marks_entry_without_removing_it() {
        let registry = ServerRegistry::new();
        registry.record_connected(
            "https://a.example/mcp",
            &sample_implementation(),
            ServerCapabilities::default(),
            mcp_protocol::PROTOCOL_VERSION,
        );
        registry.record_disconnected("https://a.example/mcp");
        let info = registry.get("https://a.example/mcp").unwrap();
        assert!(!info.connected);
    }

    #[test]
    fn connected_urls_excludes_disconnected_entries() {
        let registry = ServerRegistry::new();
        registry.record_connected(
            "https://a.example/mcp",
            &sample_implementation(),
            ServerCapabilities::default(),
            mcp_protocol::PROTOCOL_VERSION,
        );
        registry.record_connected(
            "https://b.example/mcp",
            &sample_implementation(),
            ServerCapabilities::default(),
            mcp_protocol::PROTOCOL_VERSION,
        );
        registry.record_disconnected("https://b.example/mcp");
        assert_eq!(registry.connected_urls(), vec!["https://a.example/mcp".to_string()]);
    }

    #[test]
    fn clear_empties_the_registry() {
        let registry = ServerRegistry::new();
        registry.record_connected(
            "https://a.example/mcp",
            &sample_implementation(),
            ServerCapabilities::default(),
            mcp_protocol::PROTOCOL_VERSION,
        );
        registry.clear();
        assert!(registry.all().is_empty());
    }
}
