//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the remote server monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Poll cadence settings.
    pub poll: PollConfig,

    /// Probe timeouts and metadata endpoint.
    pub probe: ProbeConfig,

    /// Transport retry configuration.
    pub retries: RetryConfig,

    /// Outbound TLS trust options.
    pub tls: TlsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Remote server definitions.
    pub servers: Vec<ServerEntry>,
}

impl MonitorConfig {
    /// Resolve every server entry into a `ServerConfig` with its probe strategy fixed.
    pub fn server_configs(&self) -> Vec<ServerConfig> {
        self.servers
            .iter()
            .map(|entry| ServerConfig::from_entry(entry, &self.probe.metadata_server_name))
            .collect()
    }
}

/// Poll scheduler cadence.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between two poll cycles.
    pub interval_secs: u64,

    /// Seconds before the first cycle runs.
    pub initial_delay_secs: u64,

    /// Every n-th cycle probes all servers; the rest only re-probe failing ones.
    pub full_sweep_period: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            initial_delay_secs: 0,
            full_sweep_period: 5,
        }
    }
}

/// Probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Connect timeout for reachability checks, in seconds.
    pub connect_timeout_secs: u64,

    /// Total request timeout for metadata calls, in seconds.
    pub request_timeout_secs: u64,

    /// Path of the account metadata endpoint, relative to the server URL.
    pub metadata_path: String,

    /// Server whose strategy defaults to the metadata check.
    pub metadata_server_name: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            request_timeout_secs: 30,
            metadata_path: "/repository/_user".to_string(),
            metadata_server_name: "DataCloud".to_string(),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Failure categories that may be retried
    /// (`interrupted_io`, `unknown_host`, `tls`).
    pub retry_on: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
            retry_on: vec![
                "interrupted_io".to_string(),
                "unknown_host".to_string(),
                "tls".to_string(),
            ],
        }
    }
}

/// TLS options for outbound connections.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TlsConfig {
    /// Accept any certificate presented by the peer.
    ///
    /// Disables certificate validation entirely. Off unless set explicitly.
    pub accept_unverified_peers: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Authentication strategy used to talk to a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    /// Basic credentials sent straight to the server.
    #[default]
    Default,
    /// Ticket acquired from the server's CAS endpoint first.
    Cas,
}

/// Health check strategy for a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStrategy {
    /// Authenticated account metadata call (identity, credit).
    Metadata,
    /// Plain TCP connect to the server's host and port.
    Reachability,
}

/// Server entry as written in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerEntry {
    /// Unique server name (compared case-insensitively).
    pub name: String,

    /// Base URL of the server.
    pub url: String,

    /// Account used to authenticate.
    #[serde(default)]
    pub username: String,

    /// Password for `username`.
    #[serde(default)]
    pub password: Option<String>,

    /// Authentication strategy.
    #[serde(default)]
    pub security_mode: SecurityMode,

    /// Explicit probe strategy; derived from the name when omitted.
    #[serde(default)]
    pub check: Option<ProbeStrategy>,
}

/// Identity and connection parameters of one remote server.
///
/// Immutable once loaded. The probe strategy is fixed here, not re-derived per probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    pub name: String,
    pub url: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub security_mode: SecurityMode,
    pub check: ProbeStrategy,
}

impl ServerConfig {
    /// Build a config, resolving the strategy against the distinguished metadata server name.
    pub fn from_entry(entry: &ServerEntry, metadata_server_name: &str) -> Self {
        let check = entry.check.unwrap_or_else(|| {
            if entry.name.eq_ignore_ascii_case(metadata_server_name) {
                ProbeStrategy::Metadata
            } else {
                ProbeStrategy::Reachability
            }
        });

        Self {
            name: entry.name.clone(),
            url: entry.url.clone(),
            username: entry.username.clone(),
            password: entry.password.clone(),
            security_mode: entry.security_mode,
            check,
        }
    }

    /// Convenience constructor for a reachability-checked server.
    pub fn reachability(name: impl Into<String>, url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            username: username.into(),
            password: None,
            security_mode: SecurityMode::Default,
            check: ProbeStrategy::Reachability,
        }
    }
}
