//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize metrics when enabled
//! - Wire the tokio task runner into a monitor built from configuration
//!
//! # Design Decisions
//! - Fail fast: a missing runtime is a startup error
//! - Polling itself still starts lazily, on the monitor's first use

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::{Handle, TryCurrentError};

use crate::config::MonitorConfig;
use crate::lifecycle::runner::TokioTaskRunner;
use crate::lifecycle::shutdown::Shutdown;
use crate::monitor::RemoteServerMonitor;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("must be called from within a tokio runtime: {0}")]
    Runtime(#[from] TryCurrentError),
}

/// Build a monitor whose polling runs on the current runtime until `shutdown` fires.
pub fn start_monitor(config: &MonitorConfig, shutdown: &Shutdown) -> Result<RemoteServerMonitor, StartupError> {
    let handle = Handle::try_current()?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let runner = Arc::new(TokioTaskRunner::new(handle, shutdown.clone()));
    let monitor = RemoteServerMonitor::from_config(config, Some(runner));

    tracing::info!(
        servers = monitor.server_list().len(),
        interval_secs = config.poll.interval_secs,
        full_sweep_period = config.poll.full_sweep_period,
        "Remote server monitor ready"
    );
    Ok(monitor)
}
