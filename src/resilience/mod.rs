//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to a remote server:
//!     → timeouts.rs (every probe call carries a deadline)
//!     → On transport failure: retries.rs (classify, check allow-list)
//!     → backoff.rs (delay before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retry policy is configuration, not code: allow-list + max retries
//! - Configuration errors (bad URLs) bypass retry entirely

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::{FailureKind, RetryPolicy};
