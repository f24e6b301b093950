//! Remote server monitoring.
//!
//! # Data Flow
//! ```text
//! registry.rs (configured servers)
//!     → scheduler.rs (recurring cycle: full sweep or fast retry)
//!     → health::Probe per due server
//!     → health::StateStore (replace if changed)
//!     → notify.rs (listeners, once per changed server, after all writes)
//! ```
//!
//! # Design Decisions
//! - Nothing runs until the first state query or listener registration
//! - State is in memory only and seeded as NotConnected for every server
//! - A new server list needs a new monitor; there is no live reconfiguration

pub mod notify;
pub mod registry;
pub mod scheduler;

use std::sync::Arc;

use crate::config::schema::{MonitorConfig, PollConfig, ServerConfig};
use crate::health::probe::{HealthProber, Probe};
use crate::health::state::ServerState;
use crate::health::store::StateStore;
use crate::lifecycle::runner::ScheduledTaskRunner;

pub use notify::{NotificationBus, StateListener};
pub use registry::ServerRegistry;
pub use scheduler::{CycleKind, PollCycle, PollScheduler};

/// Registry, state and change notification for a set of remote servers.
pub struct RemoteServerMonitor {
    registry: ServerRegistry,
    store: StateStore,
    bus: NotificationBus,
    scheduler: PollScheduler,
}

impl RemoteServerMonitor {
    /// Create a monitor. Polling starts on first `actual_state` or `add_listener`.
    ///
    /// Without a runner, no polling ever happens and states stay `NotConnected`
    /// unless `run_cycle_now` is called.
    pub fn new(
        servers: Vec<ServerConfig>,
        runner: Option<Arc<dyn ScheduledTaskRunner>>,
        prober: Arc<dyn Probe>,
        poll: &PollConfig,
    ) -> Self {
        let registry = ServerRegistry::new(servers);
        let store = StateStore::new(registry.list());
        let bus = NotificationBus::new();

        let cycle = Arc::new(PollCycle::new(
            registry.clone(),
            store.clone(),
            bus.clone(),
            prober,
            poll.full_sweep_period,
        ));
        let scheduler = PollScheduler::new(cycle, runner, poll);

        Self {
            registry,
            store,
            bus,
            scheduler,
        }
    }

    /// Create a monitor with the standard prober built from `config`.
    pub fn from_config(config: &MonitorConfig, runner: Option<Arc<dyn ScheduledTaskRunner>>) -> Self {
        Self::new(
            config.server_configs(),
            runner,
            Arc::new(HealthProber::from_config(config)),
            &config.poll,
        )
    }

    pub fn server_list(&self) -> &[ServerConfig] {
        self.registry.list()
    }

    /// Case-insensitive lookup; an empty name is simply not found.
    pub fn server_config(&self, name: &str) -> Option<&ServerConfig> {
        self.registry.lookup(name)
    }

    /// Last known state of `name`. Starts polling if it has not started yet.
    pub fn actual_state(&self, name: &str) -> Option<ServerState> {
        self.scheduler.ensure_started();
        let server = self.registry.lookup(name)?;
        self.store.get(&server.name)
    }

    /// Subscribe to state changes. Starts polling if it has not started yet.
    pub fn add_listener(&self, listener: Arc<dyn StateListener>) {
        self.scheduler.ensure_started();
        self.bus.subscribe(listener);
    }

    /// Unsubscribe a previously added listener. Returns false if it was not subscribed.
    pub fn remove_listener(&self, listener: &Arc<dyn StateListener>) -> bool {
        self.bus.unsubscribe(listener)
    }

    /// Run one cycle now and deliver its notifications. Returns the changed server names.
    pub async fn run_cycle_now(&self) -> Vec<String> {
        let cycle = self.scheduler.cycle();
        let changed = cycle.run().await;
        cycle.notify(&changed);
        changed
    }

    pub fn is_polling(&self) -> bool {
        self.scheduler.is_running()
    }
}
