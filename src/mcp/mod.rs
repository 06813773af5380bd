//! Model Context Protocol (MCP) server implementation
//!
//! JSON-RPC 2.0 over stdio: tool dispatch onto the engine session shim
//! plus read-only documentation and engine-state resources.

pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use resources::ResourceHandler;
pub use server::McpServer;
pub use tools::ToolHandler;
