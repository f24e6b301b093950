//! Remote server monitor (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!   monitor.toml
//!        │
//!        ▼
//!   ┌──────────┐     ┌───────────────┐     ┌──────────────┐
//!   │  config  │────▶│   registry    │────▶│  scheduler   │  every interval
//!   └──────────┘     └───────────────┘     └──────┬───────┘
//!                                                 │ full sweep / fast retry
//!                                                 ▼
//!                    ┌───────────────┐     ┌──────────────┐
//!                    │ net (CAS /    │◀────│    probe     │
//!                    │ basic, retry) │     │ metadata/tcp │
//!                    └───────────────┘     └──────┬───────┘
//!                                                 ▼
//!                    ┌───────────────┐     ┌──────────────┐
//!                    │   listeners   │◀────│ state store  │  only on change
//!                    └───────────────┘     └──────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use remote_monitor::config::{load_config, MonitorConfig};
use remote_monitor::health::{HealthProber, Probe, ServerState};
use remote_monitor::lifecycle::signals::shutdown_signal;
use remote_monitor::lifecycle::startup::start_monitor;
use remote_monitor::lifecycle::Shutdown;
use remote_monitor::observability::logging::init_logging;
use remote_monitor::StateListener;
use serde_json::json;

#[derive(Parser)]
#[command(name = "remote-monitor")]
#[command(about = "Health monitor for configured remote servers", long_about = None)]
struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "monitor.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll servers continuously and log state changes
    Watch,
    /// Probe every server once and print the states
    Check,
    /// Print configured servers
    List,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(&cli.config)?;
    init_logging(&config.observability.log_level);

    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => watch(&config).await?,
        Commands::Check => check(&config).await?,
        Commands::List => {
            let servers = config.server_configs();
            println!("{}", serde_json::to_string_pretty(&servers)?);
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<MonitorConfig, Box<dyn std::error::Error>> {
    load_config(path).map_err(|e| format!("{}: {}", path.display(), e).into())
}

async fn watch(config: &MonitorConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("remote-monitor v0.1.0 starting");

    let shutdown = Shutdown::new();
    let monitor = start_monitor(config, &shutdown)?;

    let logger: Arc<dyn StateListener> = Arc::new(|name: &str, state: &ServerState| {
        tracing::info!(server = %name, state = %state, "State changed");
    });
    monitor.add_listener(logger);

    shutdown_signal().await;
    shutdown.trigger();

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn check(config: &MonitorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let prober = HealthProber::from_config(config);
    let mut report = Vec::new();

    for server in config.server_configs() {
        let state = prober.probe(&server).await;
        report.push(json!({ "server": server.name, "state": state }));
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
