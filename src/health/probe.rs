//! Probe dispatch.
//!
//! # Responsibilities
//! - Expose one `Probe` interface over both check strategies
//! - Dispatch on the strategy fixed in each `ServerConfig` at load time
//! - Record per-probe metrics
//!
//! # Design Decisions
//! - Probes never fail: every error is folded into an `Error` state
//! - Strategy selection is data on the config, not a name comparison per probe

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;

use crate::config::schema::{MonitorConfig, ProbeStrategy, ServerConfig};
use crate::health::metadata::MetadataProbe;
use crate::health::reachability::ReachabilityProbe;
use crate::health::state::ServerState;
use crate::metadata::{MetadataSource, RestMetadataClient};
use crate::net::ConnectionFactory;
use crate::observability::metrics;

/// Observes the current state of one server.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, server: &ServerConfig) -> ServerState;
}

/// Standard prober combining the metadata and reachability strategies.
#[derive(Clone)]
pub struct HealthProber {
    metadata: MetadataProbe,
    reachability: ReachabilityProbe,
}

impl HealthProber {
    pub fn new(metadata_source: Arc<dyn MetadataSource>, reachability: ReachabilityProbe) -> Self {
        Self {
            metadata: MetadataProbe::new(metadata_source),
            reachability,
        }
    }

    /// Build with a REST metadata client and timeouts taken from `config`.
    pub fn from_config(config: &MonitorConfig) -> Self {
        let factory = ConnectionFactory::from_config(config);
        let source = RestMetadataClient::new(factory, config.probe.metadata_path.clone());
        let reachability = ReachabilityProbe::new(Duration::from_secs(config.probe.connect_timeout_secs));
        Self::new(Arc::new(source), reachability)
    }
}

#[async_trait]
impl Probe for HealthProber {
    async fn probe(&self, server: &ServerConfig) -> ServerState {
        let state = match server.check {
            ProbeStrategy::Metadata => self.metadata.check(server).await,
            ProbeStrategy::Reachability => self.reachability.check(server).await,
        };

        tracing::debug!(server = %server.name, strategy = ?server.check, state = %state, "Probe finished");
        metrics::record_probe(&server.name, state.health);
        state
    }
}
