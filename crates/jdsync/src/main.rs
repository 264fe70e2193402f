//! jdsync - sync captured JD cookies to a Qinglong panel
//!
//! Main entry point for the jdsync CLI.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{check, config, status, sync};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// jdsync - sync captured JD cookies to a Qinglong panel
#[derive(Parser)]
#[command(name = "jdsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Store file (default: <data dir>/jdsync/store.json)
    #[arg(long, global = true, env = "JDSYNC_STORE")]
    pub store: Option<PathBuf>,

    /// Panel request timeout in milliseconds
    #[arg(long, global = true, default_value_t = 15_000)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync the cookie from one intercepted request
    Sync(sync::SyncArgs),

    /// Show stored settings and sync state
    Status(status::StatusArgs),

    /// Validate settings and test the panel connection
    Check(check::CheckArgs),

    /// Read and write store entries
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable, stderr) + rotating JSON file
    let filter = if cli.verbose {
        "jdsync=debug,jdsync_domain=debug,jdsync_client=debug,jdsync_config=debug,info"
    } else {
        "jdsync=info,jdsync_domain=info,jdsync_client=info,jdsync_config=info,warn"
    };

    let log_dir = dirs::data_dir()
        .map(|d| d.join("jdsync").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "jdsync.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "jdsync=trace,jdsync_domain=trace,jdsync_client=trace,jdsync_config=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        store_path: cli
            .store
            .unwrap_or_else(jdsync_config::default_store_path),
        timeout: Duration::from_millis(cli.timeout_ms),
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Sync(args) => sync::run(args, &ctx).await,
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Check(args) => check::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
