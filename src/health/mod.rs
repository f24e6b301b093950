//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! ServerConfig (strategy fixed at load)
//!     → probe.rs (dispatch)
//!         Metadata     → metadata.rs (account call, credit → Ok/NoCredit)
//!         Reachability → reachability.rs (TCP connect within 15s)
//!     → ServerState (state.rs)
//!     → store.rs (replace if different, report change)
//! ```
//!
//! # Design Decisions
//! - Probes never return errors; failures are `Error` states
//! - State is per-server and rebuilt from configuration at startup
//! - Equality of whole states gates change notification

pub mod metadata;
pub mod probe;
pub mod reachability;
pub mod state;
pub mod store;

pub use probe::{HealthProber, Probe};
pub use state::{HealthState, ServerState};
pub use store::StateStore;
