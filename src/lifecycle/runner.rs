//! Recurring task execution.
//!
//! # Responsibilities
//! - Define the contract the monitor schedules against: a unit of work plus a
//!   listener told about the begin, completion or failure of each execution
//! - Provide a tokio implementation driving one sequential execution stream per task
//!
//! # Design Decisions
//! - Executions of one task never overlap; a slow execution delays the next tick
//! - A failed or panicking execution is reported to `on_error` and scheduling continues
//! - Tasks stop when the shared `Shutdown` fires

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::time::{self, MissedTickBehavior};

use crate::lifecycle::shutdown::Shutdown;

/// Failure of one task execution.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task failed: {0}")]
    Failed(String),

    #[error("task panicked: {0}")]
    Panicked(String),
}

/// A unit of recurring work.
#[async_trait]
pub trait Task: Send + Sync {
    async fn execute(&self) -> Result<(), TaskError>;
}

/// Callbacks around each execution of a task.
pub trait TaskListener: Send + Sync {
    fn on_begin(&self) {}

    fn on_complete(&self);

    fn on_error(&self, error: &TaskError);
}

/// Facility that runs a task repeatedly.
pub trait ScheduledTaskRunner: Send + Sync {
    fn run_scheduled(
        &self,
        task: Arc<dyn Task>,
        listener: Arc<dyn TaskListener>,
        initial_delay: Duration,
        interval: Duration,
    );
}

/// Runs each scheduled task as a single loop on a tokio runtime.
#[derive(Clone)]
pub struct TokioTaskRunner {
    handle: Handle,
    shutdown: Shutdown,
}

impl TokioTaskRunner {
    pub fn new(handle: Handle, shutdown: Shutdown) -> Self {
        Self { handle, shutdown }
    }
}

impl ScheduledTaskRunner for TokioTaskRunner {
    fn run_scheduled(
        &self,
        task: Arc<dyn Task>,
        listener: Arc<dyn TaskListener>,
        initial_delay: Duration,
        interval: Duration,
    ) {
        let mut shutdown = self.shutdown.subscribe();
        let period = interval.max(Duration::from_millis(1));

        self.handle.spawn(async move {
            tokio::select! {
                _ = time::sleep(initial_delay) => {}
                _ = shutdown.recv() => return,
            }

            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => run_once(&task, &listener).await,
                    _ = shutdown.recv() => {
                        tracing::info!("Scheduled task received shutdown signal, exiting loop");
                        break;
                    }
                }
            }
        });
    }
}

/// Execute `task` once, reporting the outcome to `listener`.
pub async fn run_once(task: &Arc<dyn Task>, listener: &Arc<dyn TaskListener>) {
    listener.on_begin();
    match AssertUnwindSafe(task.execute()).catch_unwind().await {
        Ok(Ok(())) => listener.on_complete(),
        Ok(Err(e)) => listener.on_error(&e),
        Err(panic) => listener.on_error(&TaskError::Panicked(panic_message(panic.as_ref()))),
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
