//! Remote server connectivity and health monitoring.
//!
//! Keeps a registry of configured remote servers, probes them on an adaptive
//! cadence, tracks each server's last known state and notifies listeners only
//! when a state actually changes.

pub mod config;
pub mod health;
pub mod lifecycle;
pub mod metadata;
pub mod monitor;
pub mod net;
pub mod observability;
pub mod resilience;

pub use config::schema::MonitorConfig;
pub use health::{HealthState, ServerState};
pub use lifecycle::Shutdown;
pub use monitor::{RemoteServerMonitor, StateListener};
