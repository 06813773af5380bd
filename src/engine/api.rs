//! Engine abstraction seam
//!
//! [`EngineHandle`] is one live connection to a MATLAB engine process;
//! [`EngineBackend`] creates and discovers handles. The session shim only
//! ever talks to these traits, so the vendor transport can be swapped for
//! an in-memory fake in tests.
//!
//! Error contract: `evaluate` returns `Err` only for handle-level faults
//! (process death, broken pipe). Command-level failures the engine itself
//! reports come back in [`EvalStreams::stderr`]. The typed operations
//! (`get_variable`, `set_variable`, `call_function`) surface command-level
//! failures as [`MatlabMcpError::Execution`].
//!
//! [`MatlabMcpError::Execution`]: crate::error::MatlabMcpError::Execution

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Captured stdout/stderr text from one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalStreams {
    /// Everything the command printed to standard output
    pub stdout: String,

    /// Engine-reported error text, empty when the command succeeded
    pub stderr: String,
}

impl EvalStreams {
    /// True when the engine reported no error for this evaluation
    pub fn is_clean(&self) -> bool {
        self.stderr.trim().is_empty()
    }
}

/// One live connection to a MATLAB engine process
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngineHandle: Send {
    /// Submit code for evaluation, capturing both output streams
    async fn evaluate(&mut self, code: &str) -> Result<EvalStreams>;

    /// Read a workspace variable as JSON
    async fn get_variable(&mut self, name: &str) -> Result<Value>;

    /// Write a workspace variable from JSON
    async fn set_variable(&mut self, name: &str, value: &Value) -> Result<()>;

    /// Call a named engine function with positional arguments and a
    /// requested number of return values
    async fn call_function(&mut self, name: &str, args: &[Value], nargout: usize)
        -> Result<Vec<Value>>;

    /// Name under which this engine is shared, if any
    async fn engine_name(&mut self) -> Result<Option<String>>;

    /// Expose this engine for external connection; returns the effective
    /// session name (engine-assigned when `name` is `None`)
    async fn share<'a>(&mut self, name: Option<&'a str>) -> Result<String>;

    /// Terminate the engine process
    async fn quit(&mut self) -> Result<()>;
}

/// Factory and discovery surface for engine handles
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngineBackend: Send + Sync {
    /// Start a fresh engine process.
    ///
    /// Errors with `NotInstalled` when the engine is absent from the
    /// machine and `Connection` when process startup fails.
    async fn start(&self, desktop: bool) -> Result<Box<dyn EngineHandle>>;

    /// Names of shared sessions discoverable on this machine
    async fn find_sessions(&self) -> Result<Vec<String>>;

    /// Connect to a shared session by name, or to the first one found
    /// when `name` is `None`
    async fn connect<'a>(&self, name: Option<&'a str>) -> Result<Box<dyn EngineHandle>>;
}
