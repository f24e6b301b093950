//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ServerConfig + context URL
//!     → connection.rs (endpoint resolution, client construction)
//!     → tls.rs (trust options: system roots or opt-in accept-any)
//!     → security mode:
//!         CAS     → cas.rs (ticket-granting ticket → service ticket)
//!         Default → basic credentials scoped to host:port
//!     → ServerClient::get (retry on allow-listed transient failures)
//! ```
//!
//! # Design Decisions
//! - One client per build; clients are cheap and never shared across servers
//! - Accepting unverified peers is a caller decision, never a default

pub mod cas;
pub mod connection;
pub mod tls;

pub use connection::{ConnectionError, ConnectionFactory, ConnectionResult, ServerClient, ServerEndpoint};
