//! MATLAB MCP server entry point
//!
//! Starts one engine session, serves MCP over stdio until EOF, and stops
//! the engine on the way out even when the serve loop fails.

use clap::Parser;
use matlab_mcp_core::{
    McpServer, MatlabSession, ProcessBackend, ResourceHandler, Result, ServerConfig, ToolHandler,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "matlab-mcp-server",
    version,
    about = "MCP stdio server bridging agents to a MATLAB engine session"
)]
struct Args {
    /// Start MATLAB with the interactive desktop visible
    #[arg(long)]
    desktop: bool,

    /// MATLAB executable to launch
    #[arg(long, env = "MATLAB_MCP_MATLAB_PATH")]
    matlab_path: Option<String>,

    /// Log filter (overrides RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

async fn run(args: Args) -> Result<()> {
    let mut config = ServerConfig::load()?;
    if let Some(path) = args.matlab_path {
        config.matlab_path = path;
    }
    if args.desktop {
        config.desktop = true;
    }

    let backend = Arc::new(ProcessBackend::new(config.clone()));
    let session = Arc::new(Mutex::new(MatlabSession::new(backend, config.clone())));

    // Eager start so the first tool call does not pay the engine boot cost
    session.lock().await.start(config.desktop).await?;

    let server = McpServer::new(
        ToolHandler::new(session.clone(), &config.initial_modes),
        ResourceHandler::new(session.clone()),
    );

    let outcome = server.run().await;

    info!("Shutting down MATLAB engine");
    if let Err(e) = session.lock().await.stop().await {
        warn!("Engine shutdown reported an error: {e}");
    }

    outcome
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for JSON-RPC
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_level.clone())),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        error!("Fatal: {e}");
        std::process::exit(1);
    }
}
