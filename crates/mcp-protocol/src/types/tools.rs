//! `tools/list` entry shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    /// Not part of the wire form; stamped by the bridge when aggregating
    /// tools across servers so callers know which client owns the tool.
    #[serde(skip)]
    pub server_url: Option<String>,
}
