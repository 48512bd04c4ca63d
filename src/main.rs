//! Ping chain service runner.
//!
//! # Architecture Overview
//!
//! ```text
//!   client                edge service                          work service
//!   ──────  GET /ping  ┌──────────────────┐  POST /rpc/ping  ┌──────────────────┐
//!          ──────────▶ │ api.ping         │ ───────────────▶ │ api.ping         │
//!                      │  service.ping    │   traceparent    │  service.ping    │
//!                      │   rpc.client.ping│   x-deadline-ms  │   store.ping     │
//!          ◀────────── │                  │ ◀─────────────── │                  │
//!   x-trace-id         └──────────────────┘                  └──────────────────┘
//!                               │                                     │
//!                               └───── spans + correlated logs ───────┘
//!                                      (log / metrics / collector)
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ping_chain::config::load_or_default;
use ping_chain::lifecycle;
use ping_chain::observability::logging::init_logging;
use ping_chain::{EdgeConfig, WorkConfig};

#[derive(Parser)]
#[command(name = "ping-chain")]
#[command(about = "Traced two-service ping chain", version)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the client-facing edge service
    Edge,
    /// Run the downstream work service
    Work,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Edge => {
            let config: EdgeConfig = load_or_default(cli.config.as_deref())?;
            init_logging(&config.observability)?;
            tracing::info!("ping-chain edge v{} starting", env!("CARGO_PKG_VERSION"));
            lifecycle::run_edge(config).await?;
        }
        Command::Work => {
            let config: WorkConfig = load_or_default(cli.config.as_deref())?;
            init_logging(&config.observability)?;
            tracing::info!("ping-chain work v{} starting", env!("CARGO_PKG_VERSION"));
            lifecycle::run_work(config).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
