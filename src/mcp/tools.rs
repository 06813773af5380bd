//! MCP tool implementations
//!
//! Nine tools over the engine session shim:
//! - execution: execute_matlab
//! - workspace: workspace (get/set/list/clear)
//! - figures: figure (save/export/close)
//! - data: data_io (import/export/load_mat/save_mat)
//! - environment: env (version/list_toolboxes/check_toolbox), get_help
//! - meta: route_intent, select_mode, session (list/connect/current)
//!
//! Contract per operation: required arguments are validated before the
//! shim is touched; missing/invalid arguments return an error payload
//! without side effects; shim-reported failures are forwarded verbatim;
//! handle-level engine faults propagate as errors.

use crate::engine::MatlabSession;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Tool modes `select_mode` may enable
const KNOWN_MODES: &[&str] = &["essentials", "plotting", "data_io", "workspace+", "toolboxes"];

/// Keyword table for `route_intent`, checked in order
const INTENT_KEYWORDS: &[(&str, &str)] = &[
    ("plot", "plotting"),
    ("figure", "plotting"),
    ("chart", "plotting"),
    ("graph", "plotting"),
    ("import", "data_io"),
    ("export", "data_io"),
    ("load", "data_io"),
    ("save", "data_io"),
    ("workspace", "workspace+"),
    ("variable", "workspace+"),
    ("toolbox", "toolboxes"),
];

/// Tool schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (e.g., "execute_matlab")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Tool handler that validates arguments and dispatches to the session
pub struct ToolHandler {
    session: Arc<Mutex<MatlabSession>>,

    /// Enabled tool modes, owned by this handler instance (never global)
    enabled_modes: std::sync::Mutex<HashSet<String>>,
}

impl ToolHandler {
    /// Create a new tool handler over one session
    pub fn new(session: Arc<Mutex<MatlabSession>>, initial_modes: &[String]) -> Self {
        Self {
            session,
            enabled_modes: std::sync::Mutex::new(initial_modes.iter().cloned().collect()),
        }
    }

    /// Modes currently enabled for this handler
    pub fn enabled_modes(&self) -> Vec<String> {
        let modes = self
            .enabled_modes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut list: Vec<String> = modes.iter().cloned().collect();
        list.sort();
        list
    }

    /// Get list of all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: "execute_matlab".to_string(),
                description: "Execute MATLAB code and return output/errors".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "code": {"type": "string", "description": "MATLAB code to execute"}
                    },
                    "required": ["code"]
                }),
            },
            Tool {
                name: "workspace".to_string(),
                description: "Workspace get/set/list/clear operations".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "op": {
                            "type": "string",
                            "enum": ["get", "set", "list", "clear"],
                            "description": "Operation: get|set|list|clear"
                        },
                        "var": {
                            "type": "string",
                            "description": "Variable name (for get/set operations)"
                        },
                        "value": {
                            "description": "Value to set (for set operation)"
                        }
                    },
                    "required": ["op"]
                }),
            },
            Tool {
                name: "figure".to_string(),
                description: "Save/export/close MATLAB figures".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "op": {
                            "type": "string",
                            "enum": ["save", "export", "close"],
                            "description": "Operation: save|export|close"
                        },
                        "fig": {
                            "type": "integer",
                            "description": "Figure number (optional, uses current figure if not specified)"
                        },
                        "fmt": {
                            "type": "string",
                            "enum": ["png", "jpg", "svg", "pdf", "fig"],
                            "description": "Output format"
                        },
                        "dpi": {
                            "type": "integer",
                            "description": "DPI for raster formats (default: 150)"
                        },
                        "path": {
                            "type": "string",
                            "description": "Output path (auto-generated if not specified)"
                        }
                    },
                    "required": ["op"]
                }),
            },
            Tool {
                name: "data_io".to_string(),
                description: "Import/export data and load/save MAT files".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "op": {
                            "type": "string",
                            "enum": ["import", "export", "load_mat", "save_mat"],
                            "description": "Operation: import|export|load_mat|save_mat"
                        },
                        "path": {
                            "type": "string",
                            "description": "File path"
                        },
                        "var": {
                            "type": "string",
                            "description": "Variable name (for export, or specific var for load_mat)"
                        },
                        "fmt": {
                            "type": "string",
                            "description": "File format (csv, txt, xlsx, json)"
                        },
                        "variables": {
                            "type": "array",
                            "items": {"type": "string"},
                            "description": "List of variable names (for save_mat)"
                        }
                    },
                    "required": ["op", "path"]
                }),
            },
            Tool {
                name: "env".to_string(),
                description: "Get MATLAB version and toolbox information".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "op": {
                            "type": "string",
                            "enum": ["version", "list_toolboxes", "check_toolbox"],
                            "description": "Operation: version|list_toolboxes|check_toolbox"
                        },
                        "name": {
                            "type": "string",
                            "description": "Toolbox name (for check_toolbox)"
                        }
                    },
                    "required": ["op"]
                }),
            },
            Tool {
                name: "get_help".to_string(),
                description: "Retrieve MATLAB documentation or search for functions".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "Function or topic name"
                        },
                        "op": {
                            "type": "string",
                            "enum": ["help", "lookfor", "which"],
                            "description": "Operation: help (usage/examples) | lookfor (keyword search) | which (path/toolbox info)",
                            "default": "help"
                        }
                    },
                    "required": ["name"]
                }),
            },
            Tool {
                name: "route_intent".to_string(),
                description: "Lightweight routing to choose appropriate tool mode/group"
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "User query to route"
                        }
                    },
                    "required": ["query"]
                }),
            },
            Tool {
                name: "select_mode".to_string(),
                description:
                    "Enable a tool group for the session (plotting, data_io, workspace+, toolboxes)"
                        .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "mode": {
                            "type": "string",
                            "description": "Mode to enable"
                        }
                    },
                    "required": ["mode"]
                }),
            },
            Tool {
                name: "session".to_string(),
                description: "Manage MATLAB session connections (list, connect, switch sessions)"
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "op": {
                            "type": "string",
                            "enum": ["list", "connect", "current"],
                            "description": "Operation: list (show available sessions) | connect (connect to a session) | current (get current session info)"
                        },
                        "session_name": {
                            "type": "string",
                            "description": "Session name (required for 'connect' operation)"
                        }
                    },
                    "required": ["op"]
                }),
            },
        ]
    }

    /// Execute a tool call, returning the text payload for the client
    pub async fn execute(&self, tool_name: &str, params: Value) -> Result<String> {
        debug!("Executing tool: {}", tool_name);

        match tool_name {
            "execute_matlab" => self.execute_matlab(params).await,
            "workspace" => self.workspace(params).await,
            "figure" => self.figure(params).await,
            "data_io" => self.data_io(params).await,
            "env" => self.env(params).await,
            "get_help" => self.get_help(params).await,
            "route_intent" => self.route_intent(params),
            "select_mode" => self.select_mode(params),
            "session" => self.session_ops(params).await,
            _ => {
                warn!("Unknown tool: {}", tool_name);
                Ok(format!("Error: Unknown tool '{tool_name}'"))
            }
        }
    }

    // === Execution ===

    async fn execute_matlab(&self, params: Value) -> Result<String> {
        #[derive(Deserialize)]
        struct ExecuteParams {
            code: Option<String>,
        }

        let params: ExecuteParams = serde_json::from_value(params)?;
        let Some(code) = params.code.filter(|c| !c.is_empty()) else {
            return Ok("Error: No code provided".to_string());
        };

        let result = self.session.lock().await.execute(&code).await?;
        match result.error {
            Some(error) => Ok(format!("Error executing MATLAB code:\n\n{error}")),
            None => Ok(format!("MATLAB Output:\n\n{}", result.output)),
        }
    }

    // === Workspace ===

    async fn workspace(&self, params: Value) -> Result<String> {
        #[derive(Deserialize)]
        struct WorkspaceParams {
            op: Option<String>,
            var: Option<String>,
            #[serde(default)]
            value: Value,
        }

        let params: WorkspaceParams = serde_json::from_value(params)?;

        match params.op.as_deref() {
            Some("list") => {
                let listing = self.session.lock().await.list_workspace(true).await?;
                Ok(serde_json::to_string_pretty(&listing)?)
            }
            Some("get") => {
                let Some(var) = params.var else {
                    return Ok("Error: Variable name required for 'get' operation".to_string());
                };
                match self.session.lock().await.get_variable(&var).await {
                    Ok(value) => Ok(format!("Variable '{var}': {value}")),
                    Err(e) => Ok(format!("Error getting variable '{var}': {e}")),
                }
            }
            Some("set") => {
                let Some(var) = params.var else {
                    return Ok("Error: Variable name required for 'set' operation".to_string());
                };
                if params.value.is_null() {
                    return Ok("Error: Value required for 'set' operation".to_string());
                }
                match self
                    .session
                    .lock()
                    .await
                    .set_variable(&var, &params.value)
                    .await
                {
                    Ok(()) => Ok(format!("Successfully set variable '{var}'")),
                    Err(e) => Ok(format!("Error setting variable '{var}': {e}")),
                }
            }
            Some("clear") => {
                let names: Vec<String> = params.var.into_iter().collect();
                match self.session.lock().await.clear_workspace(&names).await {
                    Ok(()) if names.is_empty() => {
                        Ok("Cleared all workspace variables".to_string())
                    }
                    Ok(()) => Ok(format!("Cleared variable '{}'", names[0])),
                    Err(e) => Ok(format!("Error clearing workspace: {e}")),
                }
            }
            Some(op) => Ok(format!("Error: Unknown operation '{op}'")),
            None => Ok("Error: Operation required".to_string()),
        }
    }

    // === Figures ===

    async fn figure(&self, params: Value) -> Result<String> {
        #[derive(Deserialize)]
        struct FigureParams {
            op: Option<String>,
            #[serde(default)]
            fig: Value,
            fmt: Option<String>,
            dpi: Option<u32>,
            path: Option<String>,
        }

        let params: FigureParams = serde_json::from_value(params)?;

        match params.op.as_deref() {
            Some("save") | Some("export") => {
                let fig_num = params.fig.as_i64();
                let fmt = params.fmt.as_deref().unwrap_or("png");
                let dpi = params.dpi.unwrap_or(150);

                let result = self
                    .session
                    .lock()
                    .await
                    .save_figure(fig_num, params.path.as_deref(), fmt, dpi)
                    .await?;
                if result.success {
                    Ok(format!(
                        "Figure saved to {}",
                        result.path.unwrap_or_default()
                    ))
                } else {
                    Ok(format!(
                        "Error saving figure: {}",
                        result.error.unwrap_or_else(|| "Unknown error".to_string())
                    ))
                }
            }
            Some("close") => {
                let fig_nums: Option<Vec<i64>> = match &params.fig {
                    Value::Null => None,
                    Value::Number(n) => n.as_i64().map(|v| vec![v]),
                    Value::Array(items) => Some(items.iter().filter_map(|v| v.as_i64()).collect()),
                    _ => None,
                };

                let result = self
                    .session
                    .lock()
                    .await
                    .close_figures(fig_nums.as_deref())
                    .await?;
                if result.success {
                    match fig_nums {
                        Some(nums) => Ok(format!("Closed figure(s) {nums:?}")),
                        None => Ok("Closed all figures".to_string()),
                    }
                } else {
                    Ok(format!(
                        "Error closing figures: {}",
                        result.error.unwrap_or_else(|| "Unknown error".to_string())
                    ))
                }
            }
            Some(op) => Ok(format!("Error: Unknown operation '{op}'")),
            None => Ok("Error: Operation required".to_string()),
        }
    }

    // === Data I/O ===

    async fn data_io(&self, params: Value) -> Result<String> {
        #[derive(Deserialize)]
        struct DataIoParams {
            op: Option<String>,
            path: Option<String>,
            var: Option<String>,
            fmt: Option<String>,
            variables: Option<Vec<String>>,
        }

        let params: DataIoParams = serde_json::from_value(params)?;

        let Some(op) = params.op.as_deref() else {
            return Ok("Error: Operation required".to_string());
        };
        let Some(path) = params.path else {
            return Ok("Error: Path required".to_string());
        };

        match op {
            "import" => {
                let result = self
                    .session
                    .lock()
                    .await
                    .import_data(&path, params.fmt.as_deref())
                    .await?;
                if result.success {
                    Ok(format!("Data imported from {path}"))
                } else {
                    Ok(format!(
                        "Error importing data: {}",
                        result.error.unwrap_or_else(|| "Unknown error".to_string())
                    ))
                }
            }
            "export" => {
                let Some(var) = params.var else {
                    return Ok("Error: Variable name required for 'export' operation".to_string());
                };
                let result = self
                    .session
                    .lock()
                    .await
                    .export_data(&var, &path, params.fmt.as_deref())
                    .await?;
                if result.success {
                    Ok(format!("Variable '{var}' exported to {path}"))
                } else {
                    Ok(format!(
                        "Error exporting data: {}",
                        result.error.unwrap_or_else(|| "Unknown error".to_string())
                    ))
                }
            }
            "load_mat" => {
                let result = self
                    .session
                    .lock()
                    .await
                    .load_mat_file(&path, params.var.as_deref())
                    .await?;
                if result.success {
                    Ok(format!("MAT file loaded from {path}"))
                } else {
                    Ok(format!(
                        "Error loading MAT file: {}",
                        result.error.unwrap_or_else(|| "Unknown error".to_string())
                    ))
                }
            }
            "save_mat" => {
                let result = self
                    .session
                    .lock()
                    .await
                    .save_mat_file(&path, params.variables.as_deref())
                    .await?;
                if result.success {
                    Ok(format!("Workspace saved to {path}"))
                } else {
                    Ok(format!(
                        "Error saving MAT file: {}",
                        result.error.unwrap_or_else(|| "Unknown error".to_string())
                    ))
                }
            }
            other => Ok(format!("Error: Unknown operation '{other}'")),
        }
    }

    // === Environment ===

    async fn env(&self, params: Value) -> Result<String> {
        #[derive(Deserialize)]
        struct EnvParams {
            op: Option<String>,
            name: Option<String>,
        }

        let params: EnvParams = serde_json::from_value(params)?;

        match params.op.as_deref() {
            Some("version") => {
                let result = self.session.lock().await.get_version().await?;
                if result.is_success() {
                    Ok(result.output)
                } else {
                    Ok(format!(
                        "Error getting version: {}",
                        result.error.unwrap_or_else(|| "Unknown error".to_string())
                    ))
                }
            }
            Some("list_toolboxes") => {
                let result = self.session.lock().await.list_toolboxes().await?;
                if result.is_success() {
                    Ok(result.output)
                } else {
                    Ok(format!(
                        "Error listing toolboxes: {}",
                        result.error.unwrap_or_else(|| "Unknown error".to_string())
                    ))
                }
            }
            Some("check_toolbox") => {
                let Some(name) = params.name else {
                    return Ok(
                        "Error: Toolbox name required for 'check_toolbox' operation".to_string()
                    );
                };
                let result = self.session.lock().await.check_toolbox(&name).await?;
                if result.error.is_none() {
                    Ok(result.output)
                } else {
                    Ok(format!(
                        "Error checking toolbox: {}",
                        result.error.unwrap_or_else(|| "Unknown error".to_string())
                    ))
                }
            }
            Some(op) => Ok(format!("Error: Unknown operation '{op}'")),
            None => Ok("Error: Operation required".to_string()),
        }
    }

    async fn get_help(&self, params: Value) -> Result<String> {
        #[derive(Deserialize)]
        struct HelpParams {
            name: Option<String>,
            op: Option<String>,
        }

        let params: HelpParams = serde_json::from_value(params)?;
        let Some(name) = params.name else {
            return Ok("Error: Name required for 'get_help'".to_string());
        };
        let op = params.op.unwrap_or_else(|| "help".to_string());

        let result = self.session.lock().await.get_help(&name, &op).await?;
        if result.success {
            Ok(result.output)
        } else {
            Ok(format!(
                "Error getting help: {}",
                result.error.unwrap_or_else(|| "Unknown error".to_string())
            ))
        }
    }

    // === Meta tools ===

    fn route_intent(&self, params: Value) -> Result<String> {
        #[derive(Deserialize)]
        struct RouteParams {
            query: Option<String>,
        }

        let params: RouteParams = serde_json::from_value(params)?;
        let Some(query) = params.query else {
            return Ok("Error: Query required for 'route_intent'".to_string());
        };
        let query = query.to_lowercase();

        for (keyword, mode) in INTENT_KEYWORDS {
            if query.contains(keyword) {
                return Ok(serde_json::to_string_pretty(&json!({
                    "mode": mode,
                    "confidence": 0.8,
                    "reason": format!("Detected keyword '{keyword}'")
                }))?);
            }
        }

        Ok(serde_json::to_string_pretty(&json!({
            "mode": "essentials",
            "confidence": 0.5,
            "reason": "No specific keywords detected"
        }))?)
    }

    fn select_mode(&self, params: Value) -> Result<String> {
        #[derive(Deserialize)]
        struct ModeParams {
            mode: Option<String>,
        }

        let params: ModeParams = serde_json::from_value(params)?;
        let Some(mode) = params.mode else {
            return Ok("Error: Mode name required".to_string());
        };

        if !KNOWN_MODES.contains(&mode.as_str()) {
            return Ok(format!(
                "Error: Unknown mode '{mode}'. Known modes: {}",
                KNOWN_MODES.join(", ")
            ));
        }

        let mut modes = self
            .enabled_modes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        modes.insert(mode.clone());
        Ok(format!("Mode '{mode}' enabled for this session"))
    }

    // === Session management ===

    async fn session_ops(&self, params: Value) -> Result<String> {
        #[derive(Deserialize)]
        struct SessionParams {
            op: Option<String>,
            session_name: Option<String>,
        }

        let params: SessionParams = serde_json::from_value(params)?;

        match params.op.as_deref() {
            Some("list") => {
                let result = self.session.lock().await.list_sessions().await;
                Ok(serde_json::to_string_pretty(&result)?)
            }
            Some("connect") => {
                let Some(name) = params.session_name else {
                    return Ok(serde_json::to_string_pretty(&json!({
                        "success": false,
                        "error": "session_name is required for connect operation"
                    }))?);
                };
                let result = self.session.lock().await.connect_to_session(&name).await;
                Ok(serde_json::to_string_pretty(&result)?)
            }
            Some("current") => {
                let result = self.session.lock().await.get_current_session().await;
                Ok(serde_json::to_string_pretty(&result)?)
            }
            Some(op) => Ok(serde_json::to_string_pretty(&json!({
                "success": false,
                "error": format!("Unknown session operation: {op}")
            }))?),
            None => Ok(serde_json::to_string_pretty(&json!({
                "success": false,
                "error": "Operation required"
            }))?),
        }
    }
}
