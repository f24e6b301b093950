//! Account metadata types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::net::ConnectionError;

/// Account metadata returned by a metadata-capable server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    /// Authoritative identity of the account.
    pub email: String,

    /// Human-readable account name.
    #[serde(default)]
    pub real_name: Option<String>,

    /// Remaining credit; absent when the server does not report one.
    #[serde(default)]
    pub credit: Option<i64>,

    /// Whether the identity has been confirmed.
    #[serde(default)]
    pub email_confirmed: bool,
}

impl AccountInfo {
    /// True when credit is reported and positive.
    pub fn has_credit(&self) -> bool {
        matches!(self.credit, Some(credit) if credit > 0)
    }
}

/// Errors that can occur while fetching account metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Connection could not be built or the request failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Response body was not valid account metadata.
    #[error("invalid account metadata: {0}")]
    Decode(String),
}

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;
