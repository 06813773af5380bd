//! Process-backed engine transport
//!
//! Drives a headless `matlab` child process over stdio. Each evaluation is
//! written to a script file and run inside a try/catch harness that prints
//! an end-of-transmission marker on both output streams, so stdout and
//! stderr can be read back independently per command.
//!
//! Shared-session discovery and cross-process connection require the
//! vendor's shared engine API, which is not reachable over this transport;
//! those operations return a typed engine error. See docs/LIMITATIONS.md.

use crate::config::ServerConfig;
use crate::engine::api::{EngineBackend, EngineHandle, EvalStreams};
use crate::error::{MatlabMcpError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

const INSTALL_HINT: &str = "MATLAB was not found on this machine.\n\n\
    Install MATLAB and make sure the `matlab` executable is on the PATH,\n\
    or point MATLAB_MCP_MATLAB_PATH at the executable.";

/// Engine backend that spawns and drives `matlab` child processes
pub struct ProcessBackend {
    config: ServerConfig,
}

impl ProcessBackend {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    fn resolve_executable(&self) -> Result<PathBuf> {
        let configured = Path::new(&self.config.matlab_path);
        if configured.components().count() > 1 {
            return if configured.exists() {
                Ok(configured.to_path_buf())
            } else {
                Err(MatlabMcpError::NotInstalled(INSTALL_HINT.to_string()))
            };
        }

        // Bare name: search the PATH ourselves so a missing installation
        // reports NotInstalled instead of a spawn failure
        let path_var = std::env::var_os("PATH").unwrap_or_default();
        for dir in std::env::split_paths(&path_var) {
            let candidate = dir.join(configured);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(MatlabMcpError::NotInstalled(INSTALL_HINT.to_string()))
    }
}

#[async_trait]
impl EngineBackend for ProcessBackend {
    async fn start(&self, desktop: bool) -> Result<Box<dyn EngineHandle>> {
        let executable = self.resolve_executable()?;

        let mut command = Command::new(&executable);
        if desktop {
            command.arg("-desktop");
        } else {
            command.args(["-nodesktop", "-nosplash"]);
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(executable = %executable.display(), desktop, "Spawning MATLAB process");
        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MatlabMcpError::NotInstalled(INSTALL_HINT.to_string())
            } else {
                MatlabMcpError::Connection(format!("Failed to start MATLAB: {e}"))
            }
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MatlabMcpError::Connection("MATLAB stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MatlabMcpError::Connection("MATLAB stdout unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MatlabMcpError::Connection("MATLAB stderr unavailable".to_string()))?;

        let script_dir = tempfile::tempdir()?;
        let mut handle = ProcessHandle {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            stderr: BufReader::new(stderr),
            script_dir,
            sequence: 0,
        };

        // Wait past the startup banner by round-tripping a probe command
        let timeout = Duration::from_secs(self.config.startup_timeout_secs);
        match tokio::time::timeout(timeout, handle.evaluate("")).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(MatlabMcpError::Connection(format!(
                    "Failed to start MATLAB: {e}"
                )))
            }
            Err(_) => {
                return Err(MatlabMcpError::Connection(format!(
                    "MATLAB did not become ready within {}s",
                    self.config.startup_timeout_secs
                )))
            }
        }

        info!("MATLAB process ready");
        Ok(Box::new(handle))
    }

    async fn find_sessions(&self) -> Result<Vec<String>> {
        Err(MatlabMcpError::Engine(
            "Shared session discovery is not supported by the process transport; \
             it requires the MATLAB shared engine API"
                .to_string(),
        ))
    }

    async fn connect<'a>(&self, _name: Option<&'a str>) -> Result<Box<dyn EngineHandle>> {
        Err(MatlabMcpError::Engine(
            "Connecting to shared sessions is not supported by the process transport; \
             it requires the MATLAB shared engine API"
                .to_string(),
        ))
    }
}

/// One live MATLAB child process
pub struct ProcessHandle {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    stderr: BufReader<ChildStderr>,
    script_dir: tempfile::TempDir,
    sequence: u64,
}

impl ProcessHandle {
    /// Run one harnessed evaluation and collect both streams up to the
    /// per-command marker
    async fn round_trip(&mut self, code: &str) -> Result<EvalStreams> {
        self.sequence += 1;
        let marker = format!("<<MATLAB_MCP_EOT:{}>>", self.sequence);

        // User code goes into a script file: `run` keeps multi-line input
        // intact and executes in the base workspace
        let script_path = self
            .script_dir
            .path()
            .join(format!("cmd_{}.m", self.sequence));
        tokio::fs::write(&script_path, code).await?;

        let script_quoted = script_path.to_string_lossy().replace('\'', "''");
        let harness = format!(
            "try, __mcp_out = evalc(sprintf('run(''%s'')', '{script_quoted}')); \
             fprintf('%s', __mcp_out); clear __mcp_out; \
             catch __mcp_err, fprintf(2, '%s\\n', getReport(__mcp_err, 'basic')); \
             clear __mcp_err; end\n\
             fprintf('\\n{marker}\\n'); fprintf(2, '{marker}\\n');\n"
        );

        self.stdin.write_all(harness.as_bytes()).await.map_err(|e| {
            MatlabMcpError::Engine(format!("Failed to write to MATLAB process: {e}"))
        })?;
        self.stdin
            .flush()
            .await
            .map_err(|e| MatlabMcpError::Engine(format!("Failed to flush MATLAB stdin: {e}")))?;

        let stdout = read_until_marker(&mut self.stdout, &marker).await?;
        let stderr = read_until_marker(&mut self.stderr, &marker).await?;

        let _ = tokio::fs::remove_file(&script_path).await;
        Ok(EvalStreams { stdout, stderr })
    }
}

/// Read lines from one stream until the end-of-transmission marker,
/// accumulating everything before it
async fn read_until_marker<R>(reader: &mut BufReader<R>, marker: &str) -> Result<String>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut collected = String::new();
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).await.map_err(|e| {
            MatlabMcpError::Engine(format!("Failed to read from MATLAB process: {e}"))
        })?;
        if n == 0 {
            return Err(MatlabMcpError::Engine(
                "MATLAB process terminated unexpectedly".to_string(),
            ));
        }
        if line.trim_end() == marker {
            break;
        }
        collected.push_str(&line);
    }
    // The harness emits a separating newline before the marker
    if collected.ends_with('\n') {
        collected.pop();
    }
    Ok(collected)
}

#[async_trait]
impl EngineHandle for ProcessHandle {
    async fn evaluate(&mut self, code: &str) -> Result<EvalStreams> {
        self.round_trip(code).await
    }

    async fn get_variable(&mut self, name: &str) -> Result<Value> {
        let streams = self
            .round_trip(&format!("fprintf('%s\\n', jsonencode({name}));"))
            .await?;
        if !streams.is_clean() {
            return Err(MatlabMcpError::Execution(streams.stderr.trim().to_string()));
        }
        Ok(serde_json::from_str(streams.stdout.trim())?)
    }

    async fn set_variable(&mut self, name: &str, value: &Value) -> Result<()> {
        let json = serde_json::to_string(value)?.replace('\'', "''");
        let streams = self
            .round_trip(&format!("{name} = jsondecode('{json}');"))
            .await?;
        if !streams.is_clean() {
            return Err(MatlabMcpError::Execution(streams.stderr.trim().to_string()));
        }
        Ok(())
    }

    async fn call_function(
        &mut self,
        name: &str,
        args: &[Value],
        nargout: usize,
    ) -> Result<Vec<Value>> {
        let mut literals = Vec::with_capacity(args.len());
        for arg in args {
            let json = serde_json::to_string(arg)?.replace('\'', "''");
            literals.push(format!("jsondecode('{json}')"));
        }
        let arg_list = literals.join(", ");

        let code = match nargout {
            0 => format!("{name}({arg_list});"),
            1 => format!(
                "__mcp_r1 = {name}({arg_list}); \
                 fprintf('%s\\n', jsonencode(__mcp_r1)); clear __mcp_r1;"
            ),
            n => {
                let outs: Vec<String> = (1..=n).map(|i| format!("__mcp_r{i}")).collect();
                format!(
                    "[{}] = {name}({arg_list}); fprintf('%s\\n', jsonencode({{{}}})); clear {};",
                    outs.join(", "),
                    outs.join(", "),
                    outs.join(" ")
                )
            }
        };

        let streams = self.round_trip(&code).await?;
        if !streams.is_clean() {
            return Err(MatlabMcpError::Execution(streams.stderr.trim().to_string()));
        }
        if nargout == 0 {
            return Ok(Vec::new());
        }

        let decoded: Value = serde_json::from_str(streams.stdout.trim())?;
        if nargout == 1 {
            Ok(vec![decoded])
        } else {
            match decoded {
                Value::Array(values) => Ok(values),
                other => Ok(vec![other]),
            }
        }
    }

    async fn engine_name(&mut self) -> Result<Option<String>> {
        let streams = self
            .round_trip("fprintf('%s\\n', char(matlab.engine.engineName));")
            .await?;
        if !streams.is_clean() {
            return Ok(None);
        }
        let name = streams.stdout.trim();
        if name.is_empty() {
            Ok(None)
        } else {
            Ok(Some(name.to_string()))
        }
    }

    async fn share<'a>(&mut self, name: Option<&'a str>) -> Result<String> {
        let code = match name {
            Some(n) => format!("matlab.engine.shareEngine('{n}');"),
            None => "matlab.engine.shareEngine;".to_string(),
        };
        let streams = self.round_trip(&code).await?;
        if !streams.is_clean() {
            return Err(MatlabMcpError::Execution(streams.stderr.trim().to_string()));
        }
        if let Some(n) = name {
            return Ok(n.to_string());
        }
        self.engine_name()
            .await?
            .ok_or_else(|| MatlabMcpError::Engine("Engine reported no session name".to_string()))
    }

    async fn quit(&mut self) -> Result<()> {
        debug!("Sending exit to MATLAB process");
        if self.stdin.write_all(b"exit\n").await.is_err() {
            warn!("MATLAB stdin already closed, killing process");
            self.child
                .kill()
                .await
                .map_err(|e| MatlabMcpError::Engine(format!("Failed to kill MATLAB: {e}")))?;
            return Ok(());
        }
        let _ = self.stdin.flush().await;

        let status = self
            .child
            .wait()
            .await
            .map_err(|e| MatlabMcpError::Engine(format!("Failed to stop MATLAB: {e}")))?;
        debug!(?status, "MATLAB process exited");
        Ok(())
    }
}
