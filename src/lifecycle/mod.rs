//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build monitor with a tokio task runner
//!
//! Recurring work (runner.rs):
//!     run_scheduled → one loop per task → on_begin / on_complete / on_error
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → broadcast → scheduled loops exit
//! ```

pub mod runner;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use runner::{ScheduledTaskRunner, Task, TaskError, TaskListener, TokioTaskRunner};
pub use shutdown::Shutdown;
