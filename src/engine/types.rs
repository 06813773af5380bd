//! Result payload types for engine session operations
//!
//! Every shim operation that can fail at the command level returns one of
//! these serializable records instead of raising. Handle-level faults are
//! the only thing propagated as errors.

use serde::Serialize;
use serde_json::Value;

/// Output substituted when a command succeeds without printing anything
pub const SUCCESS_SENTINEL: &str = "Code executed successfully.";

/// Outcome of one `execute` call: captured output plus the engine's
/// error text when the command itself failed
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExecutionResult {
    pub output: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Successful execution; empty output becomes the fixed sentinel
    pub fn success(output: String) -> Self {
        let output = if output.is_empty() {
            SUCCESS_SENTINEL.to_string()
        } else {
            output
        };
        Self {
            output,
            error: None,
        }
    }

    /// Command-level failure with the engine's error text
    pub fn failure(output: String, error: impl Into<String>) -> Self {
        Self {
            output,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a figure save operation
#[derive(Debug, Clone, Serialize)]
pub struct FigureResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FigureResult {
    pub fn saved(path: String, format: String) -> Self {
        Self {
            success: true,
            path: Some(path),
            format: Some(format),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            path: None,
            format: None,
            error: Some(error.into()),
        }
    }
}

/// Generic success/error outcome for operations with no payload
/// (figure close, MAT-file load)
#[derive(Debug, Clone, Serialize)]
pub struct OpStatus {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OpStatus {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            error: None,
        }
    }

    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Outcome of a data import/export or MAT-file save
#[derive(Debug, Clone, Serialize)]
pub struct DataIoResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Workspace variable created by an import
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DataIoResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            path: None,
            variable: None,
            format: None,
            error: Some(error.into()),
        }
    }
}

/// Workspace listing: plain variable names, per-variable detail records,
/// or the degraded form when the engine's JSON could not be decoded
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WorkspaceListing {
    Names {
        variables: Vec<String>,
    },
    Detailed {
        variables: serde_json::Map<String, Value>,
    },
    DecodeFailure {
        error: String,
        raw: String,
    },
}

impl WorkspaceListing {
    /// Variable names regardless of listing shape (empty on decode failure)
    pub fn names(&self) -> Vec<String> {
        match self {
            WorkspaceListing::Names { variables } => variables.clone(),
            WorkspaceListing::Detailed { variables } => variables.keys().cloned().collect(),
            WorkspaceListing::DecodeFailure { .. } => Vec::new(),
        }
    }
}

/// Toolbox availability check
#[derive(Debug, Clone, Serialize)]
pub struct ToolboxCheck {
    pub installed: bool,
    pub output: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Help lookup outcome
#[derive(Debug, Clone, Serialize)]
pub struct HelpResult {
    pub success: bool,
    pub output: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Shared-session discovery outcome
#[derive(Debug, Clone, Serialize)]
pub struct SessionList {
    pub success: bool,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sessions: Vec<String>,

    pub count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of connecting to a shared session
#[derive(Debug, Clone, Serialize)]
pub struct ConnectResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Session still active after a failed connect attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_session: Option<String>,
}

/// Snapshot of the current session state
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub success: bool,
    pub connected: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_shared: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
