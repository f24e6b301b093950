//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check server names are present and unique (case-insensitive)
//! - Check server URLs parse and carry a host
//! - Validate value ranges (intervals and timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use crate::config::schema::MonitorConfig;
use crate::resilience::retries::FailureKind;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server #{0} has an empty name")]
    EmptyServerName(usize),

    #[error("duplicate server name '{0}'")]
    DuplicateServerName(String),

    #[error("server '{name}' has an invalid url '{url}': {reason}")]
    InvalidUrl { name: String, url: String, reason: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("unknown retry category '{0}'")]
    UnknownRetryCategory(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (idx, server) in config.servers.iter().enumerate() {
        if server.name.trim().is_empty() {
            errors.push(ValidationError::EmptyServerName(idx));
        } else if !seen.insert(server.name.to_lowercase()) {
            errors.push(ValidationError::DuplicateServerName(server.name.clone()));
        }

        match Url::parse(&server.url) {
            Ok(url) if url.host_str().is_none() => errors.push(ValidationError::InvalidUrl {
                name: server.name.clone(),
                url: server.url.clone(),
                reason: "missing host".to_string(),
            }),
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::InvalidUrl {
                name: server.name.clone(),
                url: server.url.clone(),
                reason: e.to_string(),
            }),
        }
    }

    if config.poll.interval_secs == 0 {
        errors.push(ValidationError::Zero("poll.interval_secs"));
    }
    if config.poll.full_sweep_period == 0 {
        errors.push(ValidationError::Zero("poll.full_sweep_period"));
    }
    if config.probe.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero("probe.connect_timeout_secs"));
    }
    if config.probe.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("probe.request_timeout_secs"));
    }

    for category in &config.retries.retry_on {
        if category.parse::<FailureKind>().is_err() {
            errors.push(ValidationError::UnknownRetryCategory(category.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{SecurityMode, ServerEntry};

    fn server(name: &str, url: &str) -> ServerEntry {
        ServerEntry {
            name: name.to_string(),
            url: url.to_string(),
            username: String::new(),
            password: None,
            security_mode: SecurityMode::Default,
            check: None,
        }
    }

    #[test]
    fn test_valid_config() {
        let mut config = MonitorConfig::default();
        config.servers.push(server("a", "http://a.example.com"));
        config.servers.push(server("b", "https://b.example.com:8443/ctx"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = MonitorConfig::default();
        config.servers.push(server("Hub", "http://hub"));
        config.servers.push(server("hub", "http://hub2"));
        config.servers.push(server("", "not a url"));
        config.poll.full_sweep_period = 0;
        config.retries.retry_on.push("http_500".to_string());

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateServerName("hub".to_string())));
        assert!(errors.contains(&ValidationError::EmptyServerName(2)));
        assert!(errors.contains(&ValidationError::Zero("poll.full_sweep_period")));
        assert!(errors.contains(&ValidationError::UnknownRetryCategory("http_500".to_string())));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidUrl { .. })));
    }

    #[test]
    fn test_url_without_host_rejected() {
        let mut config = MonitorConfig::default();
        config.servers.push(server("x", "mailto:ops@example.com"));
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
