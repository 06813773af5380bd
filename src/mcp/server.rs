//! MCP server with stdio transport
//!
//! JSON-RPC 2.0 over newline-delimited JSON on stdin/stdout. The serve
//! loop is generic over its reader and writer so tests can drive it with
//! in-memory pipes. Tool failures become application errors; the loop
//! itself only ends on EOF or a broken transport.

use super::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use super::resources::ResourceHandler;
use super::tools::ToolHandler;
use crate::error::Result;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP server that handles JSON-RPC requests over stdio
pub struct McpServer {
    tools: ToolHandler,
    resources: ResourceHandler,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(tools: ToolHandler, resources: ResourceHandler) -> Self {
        Self { tools, resources }
    }

    /// Run the server against real stdin/stdout until EOF
    pub async fn run(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Process requests from `reader`, writing responses to `writer`
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("MCP server started, listening on stdin...");

        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!("Received EOF, shutting down");
                    break;
                }
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    debug!("Received request: {}", line);

                    let Some(response) = self.process_request(line).await else {
                        continue;
                    };

                    let response_json = serde_json::to_string(&response).unwrap_or_else(|e| {
                        error!("Failed to serialize response: {}", e);
                        // A serialization fallback that itself cannot fail
                        format!(
                            r#"{{"jsonrpc":"2.0","error":{{"code":-32603,"message":"Serialization error: {e}"}},"id":null}}"#
                        )
                    });
                    debug!("Sending response: {}", response_json);

                    if let Err(e) = writer.write_all(response_json.as_bytes()).await {
                        error!("Failed to write response: {}", e);
                        break;
                    }
                    if let Err(e) = writer.write_all(b"\n").await {
                        error!("Failed to write newline: {}", e);
                        break;
                    }
                    if let Err(e) = writer.flush().await {
                        error!("Failed to flush stdout: {}", e);
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        info!("MCP server shutting down");
        Ok(())
    }

    /// Process a single JSON-RPC request; `None` means no response is due
    /// (notifications)
    async fn process_request(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(format!("Invalid JSON: {e}")),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.clone(),
                JsonRpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        if request.is_notification() {
            debug!("Ignoring notification: {}", request.method);
            return None;
        }

        Some(match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request).await,
            "resources/list" => self.handle_resources_list(request),
            "resources/read" => self.handle_resources_read(request).await,
            _ => JsonRpcResponse::error(request.id, JsonRpcError::method_not_found(&request.method)),
        })
    }

    /// Handle initialize request
    fn handle_initialize(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling initialize");

        JsonRpcResponse::success(
            request.id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "serverInfo": {
                    "name": "matlab-mcp-server",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "capabilities": {
                    "tools": {},
                    "resources": {}
                }
            }),
        )
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling tools/list");

        let tools = self.tools.list_tools();
        JsonRpcResponse::success(request.id, json!({ "tools": tools }))
    }

    /// Handle tools/call request
    async fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling tools/call");

        let Some(params) = request.params.as_object() else {
            return JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_params("params must be an object"),
            );
        };

        let Some(tool_name) = params.get("name").and_then(|v| v.as_str()) else {
            return JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_params("missing 'name' field"),
            );
        };

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new()));

        match self.tools.execute(tool_name, arguments).await {
            Ok(text) => JsonRpcResponse::success(
                request.id,
                json!({
                    "content": [
                        {
                            "type": "text",
                            "text": text
                        }
                    ]
                }),
            ),
            Err(e) => JsonRpcResponse::error(
                request.id,
                JsonRpcError::application_error(-32000, format!("Tool execution failed: {e}")),
            ),
        }
    }

    /// Handle resources/list request
    fn handle_resources_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling resources/list");

        let resources = self.resources.list_resources();
        JsonRpcResponse::success(request.id, json!({ "resources": resources }))
    }

    /// Handle resources/read request
    async fn handle_resources_read(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling resources/read");

        let Some(uri) = request
            .params
            .as_object()
            .and_then(|p| p.get("uri"))
            .and_then(|v| v.as_str())
        else {
            return JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_params("missing 'uri' field"),
            );
        };

        match self.resources.read_resource(uri).await {
            Ok(text) => JsonRpcResponse::success(
                request.id,
                json!({
                    "contents": [
                        {
                            "uri": uri,
                            "text": text
                        }
                    ]
                }),
            ),
            Err(e) => JsonRpcResponse::error(
                request.id,
                JsonRpcError::application_error(-32000, format!("Resource read failed: {e}")),
            ),
        }
    }
}
