//! MATLAB engine session shim
//!
//! [`MatlabSession`] owns at most one engine handle and translates every
//! workspace, figure, data, and introspection operation into validated
//! engine calls. Command-level failures come back inside result payloads;
//! only handle-level faults (missing installation, dead process) propagate
//! as errors.

use crate::config::ServerConfig;
use crate::engine::api::{EngineBackend, EngineHandle};
use crate::engine::commands::{self, DataFormat, FigureFormat, HelpOp};
use crate::engine::types::{
    ConnectResult, DataIoResult, ExecutionResult, FigureResult, HelpResult, OpStatus, SessionInfo,
    SessionList, ToolboxCheck, WorkspaceListing,
};
use crate::error::{MatlabMcpError, Result};
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// One MATLAB session: lifecycle, command translation, and session
/// discovery against a pluggable engine backend
pub struct MatlabSession {
    backend: Arc<dyn EngineBackend>,
    config: ServerConfig,
    handle: Option<Box<dyn EngineHandle>>,
    is_shared: bool,
    session_name: Option<String>,
}

impl MatlabSession {
    pub fn new(backend: Arc<dyn EngineBackend>, config: ServerConfig) -> Self {
        Self {
            backend,
            config,
            handle: None,
            is_shared: false,
            session_name: None,
        }
    }

    /// Whether a handle is currently held
    pub fn is_started(&self) -> bool {
        self.handle.is_some()
    }

    /// Start the engine. Idempotent: a second call with a live handle is a
    /// logged no-op.
    pub async fn start(&mut self, desktop: bool) -> Result<()> {
        if self.handle.is_some() {
            debug!("MATLAB engine already running");
            return Ok(());
        }

        info!(desktop, "Starting MATLAB engine...");
        let handle = self.backend.start(desktop).await.map_err(|e| {
            error!("Failed to start MATLAB engine: {e}");
            e
        })?;
        self.handle = Some(handle);
        info!("MATLAB engine started successfully");
        Ok(())
    }

    /// Stop the engine. The internal reference is cleared even when
    /// termination reports an error, which is then surfaced to the caller.
    pub async fn stop(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(mut handle) => {
                info!("Stopping MATLAB engine...");
                self.is_shared = false;
                self.session_name = None;
                if let Err(e) = handle.quit().await {
                    error!("Error stopping MATLAB engine: {e}");
                    return Err(e);
                }
                info!("MATLAB engine stopped successfully");
                Ok(())
            }
            None => {
                debug!("MATLAB engine not running, nothing to stop");
                Ok(())
            }
        }
    }

    /// Lazily start the engine and return the live handle
    async fn ensure_started(&mut self) -> Result<&mut Box<dyn EngineHandle>> {
        if self.handle.is_none() {
            debug!("Engine not started, starting now...");
            self.start(self.config.desktop).await?;
        }
        self.handle
            .as_mut()
            .ok_or_else(|| MatlabMcpError::Engine("Engine handle missing after start".to_string()))
    }

    /// Execute MATLAB code, capturing output and error streams.
    ///
    /// Empty input short-circuits with a "No code provided" result before
    /// any engine interaction. Engine-reported command failures land in
    /// the result's `error` field; handle faults propagate as errors.
    pub async fn execute(&mut self, code: &str) -> Result<ExecutionResult> {
        if code.trim().is_empty() {
            warn!("Empty code provided to execute()");
            return Ok(ExecutionResult::failure(String::new(), "No code provided"));
        }

        let handle = self.ensure_started().await?;
        debug!("Executing MATLAB code ({} chars)...", code.len());
        let streams = handle.evaluate(code).await?;

        if streams.is_clean() {
            debug!("MATLAB code executed successfully");
            Ok(ExecutionResult::success(streams.stdout))
        } else {
            warn!(
                "MATLAB execution produced stderr: {}",
                streams.stderr.chars().take(100).collect::<String>()
            );
            Ok(ExecutionResult::failure(streams.stdout, streams.stderr))
        }
    }

    /// Read a workspace variable (live round-trip, never cached)
    pub async fn get_variable(&mut self, name: &str) -> Result<Value> {
        commands::validate_identifier(name)?;
        let handle = self.ensure_started().await?;
        handle.get_variable(name).await
    }

    /// Write a workspace variable
    pub async fn set_variable(&mut self, name: &str, value: &Value) -> Result<()> {
        commands::validate_identifier(name)?;
        let handle = self.ensure_started().await?;
        handle.set_variable(name, value).await
    }

    /// Call a named engine function. The name must be a valid identifier
    /// and present on the configured allow-list.
    pub async fn call_function(
        &mut self,
        name: &str,
        args: &[Value],
        nargout: usize,
    ) -> Result<Vec<Value>> {
        commands::validate_identifier(name)?;
        if !self.config.is_function_allowed(name) {
            return Err(MatlabMcpError::InvalidOperation(format!(
                "Function '{name}' is not on the allow-list"
            )));
        }
        let handle = self.ensure_started().await?;
        handle.call_function(name, args, nargout).await
    }

    /// List workspace variables: names only, or per-variable detail
    /// records. A JSON-decode failure in detailed mode degrades to an
    /// error record carrying the raw engine text.
    pub async fn list_workspace(&mut self, detailed: bool) -> Result<WorkspaceListing> {
        let handle = self.ensure_started().await?;

        if detailed {
            let streams = handle.evaluate(commands::DETAILED_WORKSPACE_SCRIPT).await?;
            let raw = streams.stdout.trim().to_string();
            match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => Ok(WorkspaceListing::Detailed { variables: map }),
                // jsonencode renders an empty struct array as []
                Ok(Value::Array(a)) if a.is_empty() => Ok(WorkspaceListing::Detailed {
                    variables: serde_json::Map::new(),
                }),
                _ => {
                    warn!("Failed to parse workspace JSON, falling back to text");
                    Ok(WorkspaceListing::DecodeFailure {
                        error: "Failed to parse workspace info".to_string(),
                        raw,
                    })
                }
            }
        } else {
            let streams = handle.evaluate(commands::SIMPLE_WORKSPACE_COMMAND).await?;
            let variables = streams
                .stdout
                .split_whitespace()
                .map(|s| s.to_string())
                .collect();
            Ok(WorkspaceListing::Names { variables })
        }
    }

    /// Clear named variables, or everything when no names are given
    pub async fn clear_workspace(&mut self, variables: &[String]) -> Result<()> {
        if variables.is_empty() {
            let handle = self.ensure_started().await?;
            handle.evaluate(commands::CLEAR_ALL_COMMAND).await?;
            return Ok(());
        }

        // Validate every name before touching the engine
        let cleared: Vec<String> = variables
            .iter()
            .map(|name| commands::clear_variable_command(name))
            .collect::<Result<_>>()?;
        let handle = self.ensure_started().await?;
        for command in cleared {
            handle.evaluate(&command).await?;
        }
        Ok(())
    }

    /// Expose this session for external connection under an explicit or
    /// engine-assigned name; returns the effective name
    pub async fn make_shared(&mut self, name: Option<&str>) -> Result<String> {
        if let Some(requested) = name {
            commands::validate_identifier(requested)?;
        }
        let handle = self.ensure_started().await?;
        let effective = handle.share(name).await?;
        self.is_shared = true;
        self.session_name = Some(effective.clone());
        info!(session = %effective, "Session is now shared");
        Ok(effective)
    }

    /// Names of shared sessions discoverable on this machine
    pub async fn find_shared_sessions(&self) -> Result<Vec<String>> {
        self.backend.find_sessions().await
    }

    /// Connect a brand-new shim to an existing shared session.
    ///
    /// The new shim exclusively owns the discovered handle: its own
    /// `start`/`stop` semantics are unaffected by how the handle came to
    /// exist.
    pub async fn connect_to_shared(
        backend: Arc<dyn EngineBackend>,
        config: ServerConfig,
        name: Option<&str>,
    ) -> Result<Self> {
        let handle = backend.connect(name).await?;
        Ok(Self {
            backend,
            config,
            handle: Some(handle),
            is_shared: false,
            session_name: name.map(|n| n.to_string()),
        })
    }

    /// Save a figure to file. Unsupported formats fail before any engine
    /// interaction; a temporary output path is generated when none is
    /// supplied.
    pub async fn save_figure(
        &mut self,
        fig_num: Option<i64>,
        path: Option<&str>,
        format: &str,
        dpi: u32,
    ) -> Result<FigureResult> {
        let format = match FigureFormat::from_str(format) {
            Ok(f) => f,
            Err(e) => return Ok(FigureResult::failed(e.to_string())),
        };

        let path = match path {
            Some(p) => p.to_string(),
            None => match temp_figure_path(format) {
                Ok(p) => p,
                Err(e) => return Ok(FigureResult::failed(e.to_string())),
            },
        };

        let command = match commands::save_figure_command(fig_num, &path, format, dpi) {
            Ok(c) => c,
            Err(e) => return Ok(FigureResult::failed(e.to_string())),
        };

        let result = self.execute(&command).await?;
        match result.error {
            Some(err) => Ok(FigureResult::failed(err)),
            None => Ok(FigureResult::saved(path, format.to_string())),
        }
    }

    /// Close all figures, or a specific list
    pub async fn close_figures(&mut self, fig_nums: Option<&[i64]>) -> Result<OpStatus> {
        let command = commands::close_figures_command(fig_nums);
        let result = self.execute(&command).await?;
        match result.error {
            Some(err) => Ok(OpStatus::failed(err)),
            None => Ok(OpStatus::ok()),
        }
    }

    /// Load a MAT file, optionally scoped to one variable
    pub async fn load_mat_file(&mut self, path: &str, var: Option<&str>) -> Result<OpStatus> {
        let command = match commands::load_mat_command(path, var) {
            Ok(c) => c,
            Err(e) => return Ok(OpStatus::failed(e.to_string())),
        };
        let result = self.execute(&command).await?;
        match result.error {
            Some(err) => Ok(OpStatus::failed(err)),
            None => Ok(OpStatus::ok_with_message(format!("Loaded from {path}"))),
        }
    }

    /// Save workspace variables to a MAT file, all of them or a named
    /// subset
    pub async fn save_mat_file(
        &mut self,
        path: &str,
        variables: Option<&[String]>,
    ) -> Result<DataIoResult> {
        let command = match commands::save_mat_command(path, variables) {
            Ok(c) => c,
            Err(e) => return Ok(DataIoResult::failed(e.to_string())),
        };
        let result = self.execute(&command).await?;
        match result.error {
            Some(err) => Ok(DataIoResult::failed(err)),
            None => Ok(DataIoResult {
                success: true,
                path: Some(path.to_string()),
                variable: None,
                format: None,
                error: None,
            }),
        }
    }

    /// Import a data file into a workspace variable derived from the
    /// filename. Format comes from the extension when unspecified;
    /// unsupported formats fail without engine interaction.
    pub async fn import_data(&mut self, path: &str, format: Option<&str>) -> Result<DataIoResult> {
        let format = match resolve_data_format(path, format) {
            Ok(f) => f,
            Err(e) => return Ok(DataIoResult::failed(e.to_string())),
        };
        let (command, var_name) = match commands::import_data_command(path, format) {
            Ok(pair) => pair,
            Err(e) => return Ok(DataIoResult::failed(e.to_string())),
        };

        let result = self.execute(&command).await?;
        match result.error {
            Some(err) => Ok(DataIoResult::failed(err)),
            None => Ok(DataIoResult {
                success: true,
                path: None,
                variable: Some(var_name),
                format: Some(format.as_str().to_string()),
                error: None,
            }),
        }
    }

    /// Export a workspace variable to file
    pub async fn export_data(
        &mut self,
        var: &str,
        path: &str,
        format: Option<&str>,
    ) -> Result<DataIoResult> {
        let format = match resolve_data_format(path, format) {
            Ok(f) => f,
            Err(e) => return Ok(DataIoResult::failed(e.to_string())),
        };
        let command = match commands::export_data_command(var, path, format) {
            Ok(c) => c,
            Err(e) => return Ok(DataIoResult::failed(e.to_string())),
        };

        let result = self.execute(&command).await?;
        match result.error {
            Some(err) => Ok(DataIoResult::failed(err)),
            None => Ok(DataIoResult {
                success: true,
                path: Some(path.to_string()),
                variable: None,
                format: Some(format.as_str().to_string()),
                error: None,
            }),
        }
    }

    /// MATLAB version and platform info
    pub async fn get_version(&mut self) -> Result<ExecutionResult> {
        self.execute(commands::VERSION_SCRIPT).await
    }

    /// Installed toolbox listing
    pub async fn list_toolboxes(&mut self) -> Result<ExecutionResult> {
        self.execute(commands::TOOLBOX_LIST_SCRIPT).await
    }

    /// Probe whether a toolbox is installed; availability is inferred from
    /// the absence of the fixed "not found" line
    pub async fn check_toolbox(&mut self, name: &str) -> Result<ToolboxCheck> {
        let script = match commands::check_toolbox_script(name) {
            Ok(s) => s,
            Err(e) => {
                return Ok(ToolboxCheck {
                    installed: false,
                    output: String::new(),
                    error: Some(e.to_string()),
                })
            }
        };
        let result = self.execute(&script).await?;
        let installed = !result
            .output
            .to_lowercase()
            .contains(commands::TOOLBOX_NOT_FOUND_MARKER);
        Ok(ToolboxCheck {
            installed: installed && result.is_success(),
            output: result.output,
            error: result.error,
        })
    }

    /// Help lookup: usage text, keyword search, or path/toolbox location.
    /// Unknown operations fail without engine interaction.
    pub async fn get_help(&mut self, name: &str, op: &str) -> Result<HelpResult> {
        let op = match HelpOp::from_str(op) {
            Ok(o) => o,
            Err(e) => {
                return Ok(HelpResult {
                    success: false,
                    output: String::new(),
                    error: Some(e.to_string()),
                })
            }
        };
        let command = match commands::help_command(name, op) {
            Ok(c) => c,
            Err(e) => {
                return Ok(HelpResult {
                    success: false,
                    output: String::new(),
                    error: Some(e.to_string()),
                })
            }
        };
        let result = self.execute(&command).await?;
        Ok(HelpResult {
            success: result.is_success(),
            output: result.output,
            error: result.error,
        })
    }

    /// Shared sessions available on this machine, as a structured result
    pub async fn list_sessions(&self) -> SessionList {
        match self.backend.find_sessions().await {
            Ok(sessions) => {
                let count = sessions.len();
                SessionList {
                    success: true,
                    sessions,
                    count,
                    error: None,
                }
            }
            Err(e) => {
                error!("Error listing sessions: {e}");
                SessionList {
                    success: false,
                    sessions: Vec::new(),
                    count: 0,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Hot-swap the active handle onto an existing shared session.
    ///
    /// The previous handle is terminated only when it was exclusively
    /// owned by this shim; on connection failure the previous handle is
    /// left untouched, so the shim never loses a working session.
    pub async fn connect_to_session(&mut self, session_name: &str) -> ConnectResult {
        info!("Connecting to shared session '{session_name}'...");
        match self.backend.connect(Some(session_name)).await {
            Ok(new_handle) => {
                if let Some(mut old) = self.handle.take() {
                    if !self.is_shared {
                        // Exclusively owned: terminate before dropping
                        if let Err(e) = old.quit().await {
                            warn!("Failed to stop old engine: {e}");
                        }
                    }
                }
                self.handle = Some(new_handle);
                self.is_shared = true;
                self.session_name = Some(session_name.to_string());
                info!("Successfully connected to '{session_name}'");
                ConnectResult {
                    success: true,
                    session_name: Some(session_name.to_string()),
                    message: Some(format!("Successfully connected to '{session_name}'")),
                    error: None,
                    current_session: None,
                }
            }
            Err(e) => {
                error!("Failed to connect to session '{session_name}': {e}");
                ConnectResult {
                    success: false,
                    session_name: None,
                    message: None,
                    error: Some(format!("Failed to connect to '{session_name}': {e}")),
                    current_session: self.session_name.clone(),
                }
            }
        }
    }

    /// Snapshot of the current session: reports `connected=false` without
    /// raising when no handle is held
    pub async fn get_current_session(&mut self) -> SessionInfo {
        if self.handle.is_none() {
            return SessionInfo {
                success: true,
                connected: false,
                is_shared: None,
                session_name: None,
                version: None,
                message: Some("No active MATLAB session".to_string()),
                error: None,
            };
        }

        let engine_name = match self.handle.as_mut() {
            Some(handle) => handle.engine_name().await.unwrap_or_else(|e| {
                debug!("Could not read engine name: {e}");
                None
            }),
            None => None,
        };

        let version = match self.get_version().await {
            Ok(result) => result
                .output
                .lines()
                .next()
                .unwrap_or("Unknown")
                .to_string(),
            Err(e) => {
                debug!("Could not read engine version: {e}");
                "Unknown".to_string()
            }
        };

        let session_name = engine_name
            .or_else(|| self.session_name.clone())
            .unwrap_or_else(|| "unnamed".to_string());

        SessionInfo {
            success: true,
            connected: true,
            is_shared: Some(self.is_shared),
            session_name: Some(session_name),
            version: Some(version),
            message: None,
            error: None,
        }
    }
}

/// Resolve a data format from an explicit hint or the file extension
fn resolve_data_format(path: &str, format: Option<&str>) -> Result<DataFormat> {
    match format {
        Some(f) => DataFormat::from_str(f),
        None => {
            let ext = Path::new(path)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("");
            DataFormat::from_str(ext)
        }
    }
}

/// Auto-generate a temporary output path for a figure
fn temp_figure_path(format: FigureFormat) -> Result<String> {
    let file = tempfile::Builder::new()
        .prefix("matlab_fig_")
        .suffix(&format!(".{}", format.extension()))
        .tempfile()?;
    let path = file.into_temp_path();
    let kept = path
        .keep()
        .map_err(|e| MatlabMcpError::Other(format!("Failed to keep temp path: {e}")))?;
    Ok(kept.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::api::{EvalStreams, MockEngineBackend, MockEngineHandle};

    fn session_with_backend(backend: MockEngineBackend) -> MatlabSession {
        MatlabSession::new(Arc::new(backend), ServerConfig::default())
    }

    #[tokio::test]
    async fn test_execute_empty_code_skips_engine() {
        // Backend with no expectations: any start() call would panic
        let backend = MockEngineBackend::new();
        let mut session = session_with_backend(backend);

        for code in ["", "   ", "\t\n  "] {
            let result = session.execute(code).await.unwrap();
            assert_eq!(result.error.as_deref(), Some("No code provided"));
            assert!(!session.is_started());
        }
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let mut backend = MockEngineBackend::new();
        backend.expect_start().times(1).returning(|_| {
            let mut handle = MockEngineHandle::new();
            handle.expect_quit().returning(|| Ok(()));
            Ok(Box::new(handle))
        });

        let mut session = session_with_backend(backend);
        session.start(false).await.unwrap();
        // Second start must not hit the backend again (times(1) above)
        session.start(false).await.unwrap();
        assert!(session.is_started());
    }

    #[tokio::test]
    async fn test_stop_clears_handle_even_on_quit_error() {
        let mut backend = MockEngineBackend::new();
        backend.expect_start().times(1).returning(|_| {
            let mut handle = MockEngineHandle::new();
            handle
                .expect_quit()
                .returning(|| Err(MatlabMcpError::Engine("quit failed".to_string())));
            Ok(Box::new(handle))
        });

        let mut session = session_with_backend(backend);
        session.start(false).await.unwrap();

        let err = session.stop().await.unwrap_err();
        assert!(matches!(err, MatlabMcpError::Engine(_)));
        // Fail-safe cleanup: no handle remains despite the error
        assert!(!session.is_started());
    }

    #[tokio::test]
    async fn test_execute_auto_starts() {
        let mut backend = MockEngineBackend::new();
        backend.expect_start().times(1).returning(|_| {
            let mut handle = MockEngineHandle::new();
            handle.expect_evaluate().returning(|_| {
                Ok(EvalStreams {
                    stdout: String::new(),
                    stderr: String::new(),
                })
            });
            Ok(Box::new(handle))
        });

        let mut session = session_with_backend(backend);
        let result = session.execute("x = 1;").await.unwrap();
        assert!(session.is_started());
        assert_eq!(result.output, crate::engine::types::SUCCESS_SENTINEL);
    }

    #[tokio::test]
    async fn test_execute_command_error_is_returned_not_raised() {
        let mut backend = MockEngineBackend::new();
        backend.expect_start().returning(|_| {
            let mut handle = MockEngineHandle::new();
            handle.expect_evaluate().returning(|_| {
                Ok(EvalStreams {
                    stdout: String::new(),
                    stderr: "Undefined function 'foo'.".to_string(),
                })
            });
            Ok(Box::new(handle))
        });

        let mut session = session_with_backend(backend);
        let result = session.execute("foo").await.unwrap();
        assert_eq!(result.error.as_deref(), Some("Undefined function 'foo'."));
    }

    #[tokio::test]
    async fn test_unsupported_figure_format_skips_engine() {
        let backend = MockEngineBackend::new();
        let mut session = session_with_backend(backend);

        let result = session.save_figure(None, None, "bmp", 150).await.unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Unsupported format"));
        assert!(!session.is_started());
    }

    #[tokio::test]
    async fn test_unsupported_data_format_skips_engine() {
        let backend = MockEngineBackend::new();
        let mut session = session_with_backend(backend);

        let result = session
            .import_data("/tmp/data.parquet", None)
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Unsupported format"));
        assert!(!session.is_started());
    }

    #[tokio::test]
    async fn test_call_function_enforces_allowlist() {
        let backend = MockEngineBackend::new();
        let mut session = session_with_backend(backend);

        let err = session
            .call_function("system", &[Value::String("ls".to_string())], 1)
            .await
            .unwrap_err();
        assert!(matches!(err, MatlabMcpError::InvalidOperation(_)));
        assert!(!session.is_started());
    }

    #[tokio::test]
    async fn test_get_variable_rejects_bad_identifier() {
        let backend = MockEngineBackend::new();
        let mut session = session_with_backend(backend);

        let err = session.get_variable("x; quit").await.unwrap_err();
        assert!(matches!(err, MatlabMcpError::InvalidOperation(_)));
        assert!(!session.is_started());
    }

    #[tokio::test]
    async fn test_get_help_unknown_op_skips_engine() {
        let backend = MockEngineBackend::new();
        let mut session = session_with_backend(backend);

        let result = session.get_help("plot", "rm").await.unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Unknown help operation"));
        assert!(!session.is_started());
    }

    #[tokio::test]
    async fn test_connect_failure_preserves_handle() {
        let mut backend = MockEngineBackend::new();
        backend.expect_start().times(1).returning(|_| {
            let handle = MockEngineHandle::new();
            Ok(Box::new(handle))
        });
        backend
            .expect_connect()
            .returning(|_| Err(MatlabMcpError::Connection("no such session".to_string())));

        let mut session = session_with_backend(backend);
        session.start(false).await.unwrap();

        let result = session.connect_to_session("ghost").await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("ghost"));
        // Prior handle untouched
        assert!(session.is_started());
    }

    #[tokio::test]
    async fn test_connect_quits_exclusively_owned_handle() {
        let mut backend = MockEngineBackend::new();
        backend.expect_start().times(1).returning(|_| {
            let mut handle = MockEngineHandle::new();
            // Exclusively owned handle must be terminated on hot-swap
            handle.expect_quit().times(1).returning(|| Ok(()));
            Ok(Box::new(handle))
        });
        backend.expect_connect().returning(|_| {
            let handle = MockEngineHandle::new();
            Ok(Box::new(handle) as Box<dyn EngineHandle>)
        });

        let mut session = session_with_backend(backend);
        session.start(false).await.unwrap();

        let result = session.connect_to_session("shared_one").await;
        assert!(result.success);
        assert_eq!(result.session_name.as_deref(), Some("shared_one"));
    }

    #[tokio::test]
    async fn test_current_session_without_handle() {
        let backend = MockEngineBackend::new();
        let mut session = session_with_backend(backend);

        let info = session.get_current_session().await;
        assert!(info.success);
        assert!(!info.connected);
        assert_eq!(info.message.as_deref(), Some("No active MATLAB session"));
    }
}
