//! Loads the `mcpServers` configuration document.
//!
//! This module only parses the documented JSON shape from caller-supplied
//! paths; discovering *which* paths to read (per-user config dir,
//! per-workspace override) is a host-application concern.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct RawServerEntry {
    url: Option<String>,
    #[serde(default)]
    headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawConfigFile {
    #[serde(rename = "mcpServers", default)]
    mcp_servers: HashMap<String, RawServerEntry>,
}

/// A parsed, validated `mcpServers` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfigEntry {
    pub name: String,
    pub url: String,
    pub headers: HashMap<String, String>,
}

/// # Errors
/// [`ConfigError::Io`] / [`ConfigError::Parse`] for the file at `path`.
/// Entries without a `url` field are skipped with a warning, not a
/// hard failure.
fn load_one(path: &Path) -> Result<HashMap<String, ServerConfigEntry>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let parsed: RawConfigFile = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    let mut entries = HashMap::new();
    for (name, entry) in parsed.mcp_servers {
        match entry.url {
            Some(url) => {
                entries.insert(
                    name.clone(),
                    ServerConfigEntry {
                        name,
                        url,
                        headers: entry.headers,
                    },
                );
            }
            None => tracing::warn!(server = %name, path = %path.display(), "skipping mcpServers entry with no url"),
        }
    }
    Ok(entries)
}

/// Load and merge a global and a local `mcpServers` document; local entries
/// override global ones by name. Either path may be absent on disk — a
/// missing *local* override is common and not logged as an error, but any
/// other I/O failure propagates.
///
/// # Errors
/// Propagates parse failures from either file, and I/O failures other than
/// "file not found" for the local override.
pub fn load_merged(
    global_path: &Path,
    local_path: Option<&Path>,
) -> Result<Vec<ServerConfigEntry>, ConfigError> {
    let mut merged = load_one(global_path)?;

    if let Some(local_path) = local_path {
        match load_one(local_path) {
            Ok(local) => merged.extend(local),
            Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
    }

    Ok(merged.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn local_override_wins_on_name_collision() {
        let dir = tempfile::tempdir().unwrap();
        let global = write_config(
            dir.path(),
            "global.json",
            r#"{"mcpServers": {"search": {"url": "https://global.example/mcp"}}}"#,
        );
        let local = write_config(
            dir.path(),
            "local.json",
            r#"{"mcpServers": {"search": {"url": "https://local.example/mcp"}}}"#,
        );

        let merged = load_merged(&global, Some(&local)).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].url, "https://local.example/mcp");
    }

    #[test]
    fn entries_without_url_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let global = write_config(
            dir.path(),
            "global.json",
            r#"{"mcpServers": {"broken": {}, "ok": {"url": "https://ok.example/mcp"}}}"#,
        );
        let merged = load_merged(&global, None).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "ok");
    }

    #[test]
    fn missing_local_override_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let global = write_config(
            dir.path(),
            "global.json",
            r#"{"mcpServers": {"search": {"url": "https://global.example/mcp"}}}"#,
        );
        let missing = dir.path().join("does-not-exist.json");
        let merged = load_merged(&global, Some(&missing)).unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn headers_are_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let global = write_config(
            dir.path(),
            "global.json",
            r#"{"mcpServers": {"search": {"url": "https://example/mcp", "headers": {"Authorization": "Bearer xyz"}}}}"#,
        );
        let merged = load_merged(&global, None).unwrap();
        assert_eq!(merged[0].headers["Authorization"], "Bearer xyz");
    }
}
