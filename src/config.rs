//! Server configuration
//!
//! Layers defaults, an optional `matlab-mcp.toml` file, and `MATLAB_MCP_*`
//! environment variables into a single [`ServerConfig`]. Environment
//! variables take precedence over the file, which takes precedence over
//! built-in defaults.

use crate::error::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Default function allow-list for `call_function`.
///
/// Arbitrary engine functions are not callable by name; only identifiers on
/// this list (or one supplied via configuration) are dispatched.
const DEFAULT_FUNCTION_ALLOWLIST: &[&str] = &[
    "abs", "disp", "eye", "histogram", "length", "linspace", "max", "mean", "median", "mesh",
    "min", "numel", "ones", "plot", "prod", "rand", "randn", "size", "sort", "sqrt", "std", "sum",
    "surf", "transpose", "var", "version", "zeros",
];

/// Tool modes enabled when the server starts.
const DEFAULT_INITIAL_MODES: &[&str] = &["essentials"];

/// Configuration for the MCP server and CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// MATLAB executable used by the process backend
    pub matlab_path: String,

    /// Start MATLAB with the interactive desktop visible
    pub desktop: bool,

    /// Seconds to wait for the engine banner on startup
    pub startup_timeout_secs: u64,

    /// Tool modes enabled at startup (per-instance, not global)
    pub initial_modes: Vec<String>,

    /// Function names `call_function` may dispatch
    pub function_allowlist: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            matlab_path: "matlab".to_string(),
            desktop: false,
            startup_timeout_secs: 120,
            initial_modes: DEFAULT_INITIAL_MODES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            function_allowlist: DEFAULT_FUNCTION_ALLOWLIST
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from defaults, `matlab-mcp.toml` (if present),
    /// and `MATLAB_MCP_*` environment variables.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let settings = Config::builder()
            .set_default("matlab_path", defaults.matlab_path)?
            .set_default("desktop", defaults.desktop)?
            .set_default("startup_timeout_secs", defaults.startup_timeout_secs as i64)?
            .set_default("initial_modes", defaults.initial_modes)?
            .set_default("function_allowlist", defaults.function_allowlist)?
            .add_source(File::with_name("matlab-mcp").required(false))
            .add_source(
                Environment::with_prefix("MATLAB_MCP")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("initial_modes")
                    .with_list_parse_key("function_allowlist"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Whether a function name is allowed for `call_function` dispatch
    pub fn is_function_allowed(&self, name: &str) -> bool {
        self.function_allowlist.iter().any(|f| f == name)
    }
}
