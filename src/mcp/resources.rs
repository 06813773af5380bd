//! MCP resources: static documentation and live engine state
//!
//! Read-only surface. Documentation is embedded at compile time; the
//! `matlab://` URIs are live snapshots obtained through the session shim,
//! with JSON-decode failures degrading to the raw engine text.

use crate::engine::{commands, MatlabSession};
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

const README: &str = include_str!("../../README.md");
const USER_GUIDE: &str = include_str!("../../docs/USER_GUIDE.md");
const LIMITATIONS: &str = include_str!("../../docs/LIMITATIONS.md");

/// Resource descriptor for `resources/list`
#[derive(Debug, Clone, Serialize)]
pub struct ResourceInfo {
    pub uri: String,
    pub name: String,

    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

impl ResourceInfo {
    fn new(uri: &str, name: &str, mime_type: &str) -> Self {
        Self {
            uri: uri.to_string(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
        }
    }
}

/// Read-only accessor for documentation and engine state
pub struct ResourceHandler {
    session: Arc<Mutex<MatlabSession>>,
}

impl ResourceHandler {
    pub fn new(session: Arc<Mutex<MatlabSession>>) -> Self {
        Self { session }
    }

    /// All available resources: user-facing docs and MATLAB info
    pub fn list_resources(&self) -> Vec<ResourceInfo> {
        vec![
            ResourceInfo::new("docs://readme", "README - Getting Started", "text/markdown"),
            ResourceInfo::new("docs://guide", "User Guide", "text/markdown"),
            ResourceInfo::new("docs://limitations", "Known Limitations", "text/markdown"),
            ResourceInfo::new("matlab://env/version", "MATLAB Version Info", "text/plain"),
            ResourceInfo::new(
                "matlab://env/toolboxes",
                "Installed Toolboxes (JSON)",
                "application/json",
            ),
            ResourceInfo::new(
                "matlab://session/info",
                "Session Information",
                "application/json",
            ),
            ResourceInfo::new(
                "matlab://workspace/snapshot",
                "Workspace Snapshot (JSON)",
                "application/json",
            ),
        ]
    }

    /// Return resource contents for the given URI
    pub async fn read_resource(&self, uri: &str) -> Result<String> {
        debug!("Reading resource: {}", uri);

        match uri {
            "docs://readme" => Ok(README.to_string()),
            "docs://guide" => Ok(USER_GUIDE.to_string()),
            "docs://limitations" => Ok(LIMITATIONS.to_string()),

            "matlab://env/version" => {
                let result = self.session.lock().await.get_version().await?;
                Ok(result.error.unwrap_or(result.output))
            }

            "matlab://env/toolboxes" => {
                let result = self
                    .session
                    .lock()
                    .await
                    .execute(commands::TOOLBOX_JSON_SCRIPT)
                    .await?;
                Ok(pretty_or_raw(&result.output))
            }

            "matlab://session/info" => {
                let result = self
                    .session
                    .lock()
                    .await
                    .execute(commands::SESSION_INFO_SCRIPT)
                    .await?;
                Ok(pretty_or_raw(&result.output))
            }

            "matlab://workspace/snapshot" => {
                let listing = self.session.lock().await.list_workspace(true).await?;
                Ok(serde_json::to_string_pretty(&listing)?)
            }

            other => Ok(format!("Error: Unknown resource '{other}'")),
        }
    }
}

/// Validate and pretty-print engine-produced JSON, falling back to the raw
/// text when it does not parse
fn pretty_or_raw(output: &str) -> String {
    match serde_json::from_str::<Value>(output.trim()) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| output.to_string()),
        Err(_) => output.to_string(),
    }
}
