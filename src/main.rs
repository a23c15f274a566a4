//! Chat service.
//!
//! ```text
//!   SIGINT/SIGTERM ──▶ cancellation token ──────────────┐
//!                                                       ▼
//!   config.toml ──▶ config ──▶ logger ──▶ debug server ─▶ task group
//!                               ▲            │
//!                               └── AtomicLevel (PUT /log/level)
//! ```
//!
//! The business-facing chat server is not implemented yet; the process
//! runs the debug server only.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use chat_service::lifecycle;

#[derive(Parser)]
#[command(name = "chat-service")]
#[command(about = "Chat service", long_about = None, version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "configs/config.toml")]
    config: PathBuf,
}

/// Accepts the single-dash `-config` spelling alongside `--config` and `-c`.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-config") => OsString::from("--config"),
            Some(s) if s.starts_with("-config=") => OsString::from(format!("-{s}")),
            _ => arg,
        })
        .collect()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    let shutdown = CancellationToken::new();
    if let Err(e) = lifecycle::cancel_on_signal(shutdown.clone()) {
        eprintln!("run app: register signal handlers: {e}");
        return ExitCode::FAILURE;
    }

    match lifecycle::run(&cli.config, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("run app: {e:#}");
            ExitCode::FAILURE
        }
    }
}
