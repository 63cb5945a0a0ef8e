use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use classroomd::config::ServerConfig;
use classroomd::{http, ipc};

#[derive(Parser, Debug)]
#[command(name = "classroomd")]
#[command(version)]
#[command(about = "Classroom roster, attendance and seating service")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Answer JSON-line requests on stdin (the default)
    Ipc(IpcArgs),

    /// Serve the HTTP gateway
    Serve(ServeArgs),
}

#[derive(Parser, Debug, Default)]
struct IpcArgs {
    /// Workspace directory to open before reading requests
    #[arg(long)]
    workspace: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value = "3000")]
    port: u16,

    /// JSON document backing /api/data
    #[arg(long, default_value = "database.json")]
    data_file: PathBuf,
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            data_file: args.data_file,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // stdout carries IPC responses, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match args.command.unwrap_or(Commands::Ipc(IpcArgs::default())) {
        Commands::Ipc(ipc_args) => run_ipc(ipc_args),
        Commands::Serve(serve_args) => {
            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            runtime.block_on(http::run(serve_args.into()))
        }
    }
}

fn run_ipc(args: IpcArgs) -> anyhow::Result<()> {
    let mut state = ipc::AppState::new();
    if let Some(workspace) = &args.workspace {
        state
            .open_workspace(workspace)
            .with_context(|| format!("failed to open workspace {}", workspace.display()))?;
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            // No id to echo back.
            Err(e) => ipc::err("", "bad_json", e.to_string(), None),
        };
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    Ok(())
}
