//! MATLAB MCP Server
//!
//! Bridges agents to a MATLAB engine session over the Model Context
//! Protocol:
//! - Code execution with separated output/error capture
//! - Live workspace variable access (get/set/list/clear)
//! - Figure export and data import/export in common formats
//! - Environment introspection (version, toolboxes, help)
//! - Shared-session discovery and hot-swap
//!
//! # Architecture
//!
//! The system is organized into layers:
//! - **Engine**: session shim, command synthesis, and the process-backed
//!   transport behind the `EngineHandle`/`EngineBackend` trait seam
//! - **MCP**: JSON-RPC 2.0 stdio server, tool dispatch, resources
//! - **Config**: layered defaults/file/environment settings
//!
//! Two binaries front the library: `matlab-mcp-server` (the MCP stdio
//! server) and `matlab-cli` (single command, script file, or interactive
//! REPL).

pub mod config;
pub mod engine;
pub mod error;
pub mod mcp;

// Re-export commonly used types
pub use config::ServerConfig;
pub use engine::{
    EngineBackend, EngineHandle, EvalStreams, ExecutionResult, MatlabSession, ProcessBackend,
};
pub use error::{MatlabMcpError, Result};
pub use mcp::{McpServer, ResourceHandler, ToolHandler};
