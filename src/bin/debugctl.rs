use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "debugctl")]
#[command(about = "Control CLI for the chat service debug server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8079")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show build information
    Version,
    /// Show the current log level
    Level,
    /// Change the log level (debug, info, warn, error)
    SetLevel { level: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Version => {
            let res = client.get(format!("{base}/version")).send().await?;
            let json: Value = ensure_success(res).await?.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::Level => {
            let res = client
                .get(format!("{base}/log/level"))
                .header(ACCEPT, "text/plain")
                .send()
                .await?;
            println!("{}", ensure_success(res).await?.text().await?);
        }
        Commands::SetLevel { level } => {
            let body = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("level", &level)
                .finish();
            let res = client
                .put(format!("{base}/log/level"))
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body)
                .send()
                .await?;
            println!("{}", ensure_success(res).await?.text().await?);
        }
    }

    Ok(())
}

async fn ensure_success(res: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let text = res.text().await.unwrap_or_default();
    anyhow::bail!("debug server returned status {status}: {}", text.trim())
}
