//! Engine session management and command translation
//!
//! The session shim ([`MatlabSession`]) talks to the vendor engine through
//! the [`api`] traits; [`process`] is the production transport and
//! [`commands`] is the single place engine command text is synthesized.

pub mod api;
pub mod commands;
pub mod process;
pub mod session;
pub mod types;

pub use api::{EngineBackend, EngineHandle, EvalStreams};
pub use process::ProcessBackend;
pub use session::MatlabSession;
pub use types::{
    ConnectResult, DataIoResult, ExecutionResult, FigureResult, HelpResult, OpStatus, SessionInfo,
    SessionList, ToolboxCheck, WorkspaceListing, SUCCESS_SENTINEL,
};
