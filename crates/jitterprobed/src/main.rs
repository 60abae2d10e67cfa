//! jitterprobed — the jitterprobe daemon.
//!
//! Single binary that assembles:
//! - Config loading and hot reload (notify)
//! - HTTP prober
//! - Jittered scheduler
//! - Status board + HTTP status server
//!
//! # Usage
//!
//! ```text
//! jitterprobed serve --config ./config.toml --bind 127.0.0.1:5000
//! jitterprobed check --config ./config.toml
//! ```

mod watcher;

use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use jitterprobe_api::StatusBoard;
use jitterprobe_core::EntrySet;
use jitterprobe_probe::HttpProber;
use jitterprobe_scheduler::Scheduler;

const DEFAULT_LOG_FILTER: &str = "info,jitterprobed=debug,jitterprobe=debug";

#[derive(Parser)]
#[command(name = "jitterprobed", about = "Jittered HTTP probe daemon", version)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe the configured entries and serve their status.
    Serve {
        /// Path to the TOML config file.
        #[arg(long, default_value = "./config.toml")]
        config: PathBuf,

        /// Address for the status server.
        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: SocketAddr,

        /// Load the config once and ignore later changes.
        #[arg(long)]
        no_watch: bool,
    },
    /// Validate a config file and print the accepted entries.
    Check {
        /// Path to the TOML config file.
        #[arg(long, default_value = "./config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Command::Serve {
            config,
            bind,
            no_watch,
        } => run_serve(config, bind, !no_watch).await,
        Command::Check { config } => run_check(&config),
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run_serve(config: PathBuf, bind: SocketAddr, watch_config: bool) -> anyhow::Result<()> {
    info!(config = %config.display(), "jitterprobe daemon starting");

    // ── Initialize subsystems ──────────────────────────────────

    let prober = Arc::new(HttpProber::new()?);
    let (report_tx, report_rx) = mpsc::unbounded_channel();
    let scheduler = Scheduler::new(prober, Arc::new(report_tx));
    let board = StatusBoard::new();
    info!("scheduler initialized");

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start background tasks ─────────────────────────────────

    // Report consumer.
    let board_handle = {
        let board = board.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { board.run(report_rx, shutdown).await })
    };

    // Config: watcher first, then the initial load, then hot reload.
    let config_source =
        watcher::start(config, scheduler.clone(), watch_config, shutdown_rx).await?;

    board.mark_initialized();

    // ── Start status server ────────────────────────────────────

    let router = jitterprobe_api::build_router(scheduler.clone(), board);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %bind, "status server listening");

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    scheduler.shutdown().await;
    let _ = config_source.handle.await;
    let _ = board_handle.await;

    info!("jitterprobe daemon stopped");
    Ok(())
}

fn run_check(config: &Path) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    check_report(config, &mut stdout)?;
    Ok(())
}

/// Validate `config`, write the accepted entries as pretty JSON to `out`,
/// and fail if the file is missing or any entry was rejected.
///
/// The accepted entries are written even when the check fails.
fn check_report(config: &Path, out: &mut impl Write) -> anyhow::Result<EntrySet> {
    if !config.exists() {
        anyhow::bail!("config file not found: {}", config.display());
    }

    let set = EntrySet::from_file(config)?;
    serde_json::to_writer_pretty(&mut *out, &set)?;
    writeln!(out)?;

    if !set.rejected.is_empty() {
        anyhow::bail!(
            "{} of {} entries rejected",
            set.rejected.len(),
            set.rejected.len() + set.entries.len()
        );
    }
    Ok(set)
}
