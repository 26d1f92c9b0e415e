//! Filesystem root declarations.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A file-URI-identified directory boundary the client declares to the server.
///
/// Identity (equality and hashing) is by `uri` alone, per the data model —
/// two roots with the same uri but different display names are the same root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Root {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PartialEq for Root {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}
impl Eq for Root {}

impl Hash for Root {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
    }
}
