//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//!     → server_configs() resolves each server's probe strategy once
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no live reload, a new config needs a new monitor
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::MonitorConfig;
pub use schema::PollConfig;
pub use schema::ProbeConfig;
pub use schema::ProbeStrategy;
pub use schema::RetryConfig;
pub use schema::SecurityMode;
pub use schema::ServerConfig;
pub use schema::ServerEntry;
