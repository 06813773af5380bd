//! Command-line front-end for the MATLAB engine session
//!
//! Executes a single command (`-c`), a script file (`-f`), or an
//! interactive prompt loop (`-i`) against one engine session. Exit code 0
//! on success, 1 on any error or when no mode is selected.

use clap::{CommandFactory, Parser};
use matlab_mcp_core::{MatlabSession, ProcessBackend, Result, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "matlab-cli",
    version,
    about = "Execute MATLAB code from the command line",
    after_help = "Examples:\n  \
        matlab-cli -c \"disp('Hello, MATLAB!')\"\n  \
        matlab-cli -f script.m\n  \
        matlab-cli -i\n  \
        matlab-cli -c \"x = 1:10; mean(x)\" -v"
)]
struct Args {
    /// MATLAB command to execute
    #[arg(short, long)]
    command: Option<String>,

    /// MATLAB script file to execute
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Start interactive REPL mode
    #[arg(short, long)]
    interactive: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Execute one command and print its result; returns the process exit code
async fn execute_command(session: &mut MatlabSession, code: &str, verbose: bool) -> Result<i32> {
    if verbose {
        println!("Executing: {code}");
        println!("{}", "-".repeat(60));
    }

    let result = session.execute(code).await?;
    match result.error {
        Some(error) => {
            eprintln!("Error: {error}");
            Ok(1)
        }
        None => {
            if !result.output.is_empty() {
                println!("{}", result.output);
            }
            Ok(0)
        }
    }
}

/// Execute a MATLAB script file
async fn execute_file(session: &mut MatlabSession, path: &PathBuf, verbose: bool) -> Result<i32> {
    if !path.exists() {
        eprintln!("Error: File not found: {}", path.display());
        return Ok(1);
    }

    if verbose {
        println!("Executing file: {}", path.display());
        println!("{}", "-".repeat(60));
    }

    let code = tokio::fs::read_to_string(path).await?;
    execute_command(session, &code, false).await
}

/// Interactive REPL against the engine session
async fn interactive_mode(session: &mut MatlabSession) -> Result<()> {
    println!("MATLAB Interactive Mode");
    println!("Type 'exit' or 'quit' to exit, 'help' for help");
    println!("{}", "-".repeat(60));

    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut line = String::new();

    loop {
        stdout.write_all(b"matlab> ").await?;
        stdout.flush().await?;

        line.clear();
        if stdin.read_line(&mut line).await? == 0 {
            println!("\nExiting...");
            break;
        }
        let code = line.trim();

        match code.to_lowercase().as_str() {
            "exit" | "quit" => {
                println!("Exiting...");
                break;
            }
            "help" => {
                println!(
                    "\nAvailable commands:\n  \
                     exit, quit  - Exit interactive mode\n  \
                     help        - Show this help message\n\n\
                     Type any MATLAB code to execute it.\n"
                );
                continue;
            }
            "" => continue,
            _ => {}
        }

        let result = session.execute(code).await?;
        match result.error {
            Some(error) => println!("Error: {error}"),
            None => {
                if !result.output.is_empty() {
                    println!("{}", result.output);
                }
            }
        }
    }

    Ok(())
}

async fn run(args: Args) -> Result<i32> {
    let config = ServerConfig::load()?;
    let backend = Arc::new(ProcessBackend::new(config.clone()));
    let mut session = MatlabSession::new(backend, config);

    if args.verbose {
        println!("Starting MATLAB engine...");
    }
    session.start(false).await?;
    if args.verbose {
        println!("MATLAB engine started successfully\n");
    }

    let exit_code = if let Some(command) = &args.command {
        execute_command(&mut session, command, args.verbose).await?
    } else if let Some(file) = &args.file {
        execute_file(&mut session, file, args.verbose).await?
    } else {
        interactive_mode(&mut session).await?;
        0
    };

    if let Err(e) = session.stop().await {
        eprintln!("Warning: failed to stop MATLAB cleanly: {e}");
    }
    Ok(exit_code)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.command.is_none() && args.file.is_none() && !args.interactive {
        let _ = Args::command().print_help();
        std::process::exit(1);
    }

    match run(args).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
