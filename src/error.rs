//! Error types for the MATLAB MCP server
//!
//! This module provides structured error handling using thiserror for
//! error definitions and anyhow for propagation at the edges.
//!
//! The variants mirror the propagation policy: catastrophic engine/handle
//! faults are raised as errors, while command-level MATLAB failures travel
//! inside result payloads and are never represented here.

use thiserror::Error;

/// Main error type for MATLAB MCP operations
#[derive(Error, Debug)]
pub enum MatlabMcpError {
    /// MATLAB engine is not installed or not on the PATH
    #[error("MATLAB is not available: {0}")]
    NotInstalled(String),

    /// Engine process startup or teardown failed
    #[error("MATLAB connection error: {0}")]
    Connection(String),

    /// Engine handle fault mid-session (process died, pipe broke)
    #[error("MATLAB engine error: {0}")]
    Engine(String),

    /// Engine reported a command-level failure for a typed operation
    /// (undefined variable, bad function call)
    #[error("MATLAB execution error: {0}")]
    Execution(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// MCP protocol error
    #[error("MCP protocol error: {0}")]
    McpProtocol(String),

    /// Invalid operation (e.g., disallowed function name, bad identifier)
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for MATLAB MCP operations
pub type Result<T> = std::result::Result<T, MatlabMcpError>;

/// Convert anyhow::Error to MatlabMcpError
impl From<anyhow::Error> for MatlabMcpError {
    fn from(err: anyhow::Error) -> Self {
        MatlabMcpError::Other(err.to_string())
    }
}
