//! Capability negotiation wire types (see MCP `initialize`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

pub const PROTOCOL_VERSION: &str = "2025-11-25";

/// Protocol versions this client will accept from a server.
#[must_use]
pub fn supported_protocol_versions() -> HashSet<&'static str> {
    ["2025-11-25", "2024-11-05"].into_iter().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Sub-flags for a capability that supports list-change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListChangedCapability {
    #[serde(default, rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourcesCapability {
    #[serde(default, skip_serializing_if = "is_false")]
    pub subscribe: bool,
    #[serde(default, rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RootsCapability {
    #[serde(default, rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElicitationCapability {
    #[serde(default, skip_serializing_if = "is_false")]
    pub form: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub url: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TasksCapability {
    #[serde(default, skip_serializing_if = "is_false")]
    pub list: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub cancel: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub requests: bool,
}

/// Client-declared capability matrix. Key presence is the opt-in; only
/// fields that are `Some` are serialized, per the presence-encoding rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roots: Option<RootsCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elicitation: Option<ElicitationCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<TasksCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completions: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<ListChangedCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ListChangedCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<TasksCapability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeRequestParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ClientCapabilities,
    #[serde(rename = "clientInfo")]
    pub client_info: Implementation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: Implementation,
}

/// Outcome of a successful handshake: immutable afterwards, the canonical
/// source for "does this server support feature X?" queries.
#[derive(Debug, Clone)]
pub struct NegotiationResult {
    pub protocol_version: String,
    pub server_info: Implementation,
    pub server_capabilities: ServerCapabilities,
    pub client_capabilities: ClientCapabilities,
}

impl NegotiationResult {
    #[must_use]
    pub fn supports_tools(&self) -> bool {
        self.server_capabilities.tools.is_some()
    }

    #[must_use]
    pub fn supports_resources(&self) -> bool {
        self.server_capabilities.resources.is_some()
    }

    #[must_use]
    pub fn supports_prompts(&self) -> bool {
        self.server_capabilities.prompts.is_some()
    }

    #[must_use]
    pub fn supports_completions(&self) -> bool {
        self.server_capabilities.completions.is_some()
    }

    #[must_use]
    pub fn supports_tasks(&self) -> bool {
        self.server_capabilities.tasks.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_round_trip() {
        let caps = ClientCapabilities {
            roots: Some(RootsCapability { list_changed: true }),
            sampling: Some(Map::new()),
            elicitation: Some(ElicitationCapability { form: true, url: false }),
            tasks: Some(TasksCapability { list: true, cancel: true, requests: false }),
            experimental: None,
        };
        let s = serde_json::to_string(&caps).unwrap();
        let back: ClientCapabilities = serde_json::from_str(&s).unwrap();
        assert_eq!(back.roots.unwrap().list_changed, true);
        assert_eq!(back.elicitation.unwrap().form, true);
    }

    #[test]
    fn absent_capability_is_not_serialized() {
        let caps = ClientCapabilities::default();
        let v = serde_json::to_value(&caps).unwrap();
        assert!(v.get("roots").is_none());
        assert!(v.get("sampling").is_none());
    }
}
