//! Remote server state model.
//!
//! # States
//! - NotConnected: no probe has completed yet
//! - Ok: last probe succeeded
//! - NoCredit: metadata check succeeded but the account has no credit
//! - Error: last probe failed; carries the failure message
//!
//! # State Transitions
//! ```text
//! Any state → any state, decided solely by the latest probe outcome.
//! NotConnected is only ever an initial value.
//! ```
//!
//! # Design Decisions
//! - Values are immutable snapshots; each probe creates a fresh one
//! - Full structural equality is the change-detection key

use std::fmt;
use serde::Serialize;

use crate::metadata::AccountInfo;

/// Health state tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthState {
    NotConnected,
    Ok,
    NoCredit,
    Error,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::NotConnected => "not_connected",
            HealthState::Ok => "ok",
            HealthState::NoCredit => "no_credit",
            HealthState::Error => "error",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of a server's health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerState {
    pub health: HealthState,
    /// Identity the state refers to (configured username, or the identity the server reported).
    pub username: String,
    /// Display name reported by a metadata check.
    pub display_name: Option<String>,
    pub error_message: Option<String>,
    /// Credit reported by a metadata check.
    pub credit: Option<i64>,
    /// Identity confirmation reported by a metadata check.
    pub identity_confirmed: Option<bool>,
}

impl ServerState {
    fn plain(health: HealthState, username: impl Into<String>, error_message: Option<String>) -> Self {
        Self {
            health,
            username: username.into(),
            display_name: None,
            error_message,
            credit: None,
            identity_confirmed: None,
        }
    }

    pub fn not_connected(username: impl Into<String>) -> Self {
        Self::plain(HealthState::NotConnected, username, None)
    }

    pub fn ok(username: impl Into<String>) -> Self {
        Self::plain(HealthState::Ok, username, None)
    }

    pub fn error(username: impl Into<String>, message: Option<String>) -> Self {
        Self::plain(HealthState::Error, username, message)
    }

    /// State derived from a successful metadata call.
    pub fn from_account(account: AccountInfo) -> Self {
        let health = if account.has_credit() {
            HealthState::Ok
        } else {
            HealthState::NoCredit
        };

        Self {
            health,
            username: account.email,
            display_name: account.real_name,
            error_message: None,
            credit: account.credit,
            identity_confirmed: Some(account.email_confirmed),
        }
    }

    pub fn is_error(&self) -> bool {
        self.health == HealthState::Error
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.health, self.username)?;
        if let Some(credit) = self.credit {
            write!(f, " credit={}", credit)?;
        }
        if let Some(msg) = &self.error_message {
            write!(f, ": {}", msg)?;
        }
        Ok(())
    }
}
