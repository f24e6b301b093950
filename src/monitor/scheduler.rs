//! Poll scheduling.
//!
//! # Responsibilities
//! - Start exactly one recurring poll task, lazily, on first use
//! - Decide per cycle which servers to probe
//! - Write changed states to the store, then notify listeners
//!
//! # Cadence
//! ```text
//! iteration % full_sweep_period == 0 → full sweep: probe every server
//! otherwise                          → fast retry: probe only servers in Error
//! ```
//! The iteration counter starts at 0 and advances after every cycle,
//! whatever its kind.
//!
//! # Design Decisions
//! - One execution stream per monitor; cycles never overlap
//! - Each server's probe is isolated; a panic becomes an Error state for that server
//! - Store writes for a cycle finish before any listener is called

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::FutureExt;

use crate::config::schema::{PollConfig, ServerConfig};
use crate::health::probe::Probe;
use crate::health::state::ServerState;
use crate::health::store::StateStore;
use crate::lifecycle::runner::{panic_message, ScheduledTaskRunner, Task, TaskError, TaskListener};
use crate::monitor::notify::NotificationBus;
use crate::monitor::registry::ServerRegistry;
use crate::observability::metrics;

/// Which servers a cycle covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    FullSweep,
    FastRetry,
}

impl CycleKind {
    pub fn for_iteration(iteration: u64, full_sweep_period: u64) -> Self {
        if full_sweep_period == 0 || iteration % full_sweep_period == 0 {
            CycleKind::FullSweep
        } else {
            CycleKind::FastRetry
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CycleKind::FullSweep => "full_sweep",
            CycleKind::FastRetry => "fast_retry",
        }
    }
}

/// One poll cycle's logic plus the state it carries between cycles.
pub struct PollCycle {
    registry: ServerRegistry,
    store: StateStore,
    bus: NotificationBus,
    prober: Arc<dyn Probe>,
    full_sweep_period: u64,
    iteration: AtomicU64,
    running: tokio::sync::Mutex<()>,
    pending: Mutex<Vec<String>>,
}

impl PollCycle {
    pub fn new(
        registry: ServerRegistry,
        store: StateStore,
        bus: NotificationBus,
        prober: Arc<dyn Probe>,
        full_sweep_period: u64,
    ) -> Self {
        Self {
            registry,
            store,
            bus,
            prober,
            full_sweep_period,
            iteration: AtomicU64::new(0),
            running: tokio::sync::Mutex::new(()),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Probe the servers due this cycle. Returns names whose state changed.
    pub async fn run(&self) -> Vec<String> {
        let _guard = self.running.lock().await;
        let started = Instant::now();
        let iteration = self.iteration.load(Ordering::SeqCst);
        let kind = CycleKind::for_iteration(iteration, self.full_sweep_period);

        let targets: Vec<&ServerConfig> = match kind {
            CycleKind::FullSweep => self.registry.list().iter().collect(),
            CycleKind::FastRetry => self
                .registry
                .list()
                .iter()
                .filter(|server| self.store.get(&server.name).is_some_and(|s| s.is_error()))
                .collect(),
        };

        tracing::debug!(iteration, kind = kind.as_str(), servers = targets.len(), "Poll cycle starting");

        let mut changed = Vec::new();
        for server in targets {
            let state = self.probe_isolated(server).await;
            if self.store.replace_if_changed(&server.name, state) {
                metrics::record_state_change(&server.name);
                changed.push(server.name.clone());
            }
        }

        self.iteration.fetch_add(1, Ordering::SeqCst);
        metrics::record_cycle(kind.as_str(), started);
        changed
    }

    async fn probe_isolated(&self, server: &ServerConfig) -> ServerState {
        match AssertUnwindSafe(self.prober.probe(server)).catch_unwind().await {
            Ok(state) => state,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(server = %server.name, panic = %message, "Probe panicked");
                ServerState::error(&server.username, Some(format!("probe panicked: {}", message)))
            }
        }
    }

    /// Tell every listener about each changed server's current state.
    pub fn notify(&self, changed: &[String]) {
        for name in changed {
            if let Some(state) = self.store.get(name) {
                tracing::info!(server = %name, state = %state, "Remote server has new state");
                self.bus.notify(name, &state);
            }
        }
    }

    fn take_pending(&self) -> Vec<String> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait]
impl Task for PollCycle {
    async fn execute(&self) -> Result<(), TaskError> {
        let changed = self.run().await;
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        for name in changed {
            if !pending.contains(&name) {
                pending.push(name);
            }
        }
        Ok(())
    }
}

/// Delivers the changes recorded by the last completed cycle.
pub struct CycleNotifier {
    cycle: Arc<PollCycle>,
}

impl TaskListener for CycleNotifier {
    fn on_complete(&self) {
        let changed = self.cycle.take_pending();
        self.cycle.notify(&changed);
    }

    fn on_error(&self, error: &TaskError) {
        tracing::error!(error = %error, "Error in remote server status task");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedulerState {
    Unstarted,
    Running,
}

/// Lazily starts the recurring poll task.
pub struct PollScheduler {
    state: Mutex<SchedulerState>,
    runner: Option<Arc<dyn ScheduledTaskRunner>>,
    cycle: Arc<PollCycle>,
    initial_delay: Duration,
    interval: Duration,
}

impl PollScheduler {
    pub fn new(cycle: Arc<PollCycle>, runner: Option<Arc<dyn ScheduledTaskRunner>>, poll: &PollConfig) -> Self {
        if runner.is_none() {
            tracing::info!("No scheduled task runner; remote server status task won't be scheduled");
        }

        Self {
            state: Mutex::new(SchedulerState::Unstarted),
            runner,
            cycle,
            initial_delay: Duration::from_secs(poll.initial_delay_secs),
            interval: Duration::from_secs(poll.interval_secs),
        }
    }

    /// Start the poll task unless already running. Returns true if this call started it.
    pub fn ensure_started(&self) -> bool {
        let Some(runner) = &self.runner else {
            return false;
        };

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == SchedulerState::Running {
            return false;
        }

        let notifier = Arc::new(CycleNotifier {
            cycle: self.cycle.clone(),
        });
        runner.run_scheduled(self.cycle.clone(), notifier, self.initial_delay, self.interval);
        *state = SchedulerState::Running;

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            initial_delay_secs = self.initial_delay.as_secs(),
            "Remote server status task scheduled"
        );
        true
    }

    pub fn is_running(&self) -> bool {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) == SchedulerState::Running
    }

    pub fn cycle(&self) -> &Arc<PollCycle> {
        &self.cycle
    }
}
