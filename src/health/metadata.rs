//! Metadata (account/credit) check.

use std::sync::Arc;

use crate::config::schema::ServerConfig;
use crate::health::state::ServerState;
use crate::metadata::MetadataSource;

/// Probes a server by fetching the configured account's metadata.
///
/// Success yields `Ok` or `NoCredit` with identity fields taken from the
/// response. Any failure yields `Error` under the configured username, since
/// the server returned no authoritative identity.
#[derive(Clone)]
pub struct MetadataProbe {
    source: Arc<dyn MetadataSource>,
}

impl MetadataProbe {
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self { source }
    }

    pub async fn check(&self, server: &ServerConfig) -> ServerState {
        match self.source.fetch_account(server).await {
            Ok(account) => ServerState::from_account(account),
            Err(e) => {
                tracing::warn!(server = %server.name, error = %e, "Metadata server connection problem");
                ServerState::error(&server.username, Some(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ProbeStrategy, SecurityMode};
    use crate::health::state::HealthState;
    use crate::metadata::{AccountInfo, MetadataError, MetadataResult};
    use crate::net::ConnectionError;
    use async_trait::async_trait;

    struct Fixed(Option<i64>);

    #[async_trait]
    impl MetadataSource for Fixed {
        async fn fetch_account(&self, _server: &ServerConfig) -> MetadataResult<AccountInfo> {
            Ok(AccountInfo {
                email: "remote@example.com".to_string(),
                real_name: Some("Remote".to_string()),
                credit: self.0,
                email_confirmed: true,
            })
        }
    }

    struct Failing;

    #[async_trait]
    impl MetadataSource for Failing {
        async fn fetch_account(&self, _server: &ServerConfig) -> MetadataResult<AccountInfo> {
            Err(MetadataError::from(ConnectionError::Status(503)))
        }
    }

    fn server() -> ServerConfig {
        ServerConfig {
            name: "DataCloud".to_string(),
            url: "https://cloud.example.com".to_string(),
            username: "configured@example.com".to_string(),
            password: Some("pw".to_string()),
            security_mode: SecurityMode::Default,
            check: ProbeStrategy::Metadata,
        }
    }

    #[tokio::test]
    async fn test_positive_credit_is_ok() {
        let state = MetadataProbe::new(Arc::new(Fixed(Some(100)))).check(&server()).await;
        assert_eq!(state.health, HealthState::Ok);
        assert_eq!(state.username, "remote@example.com");
        assert_eq!(state.display_name.as_deref(), Some("Remote"));
        assert_eq!(state.identity_confirmed, Some(true));
    }

    #[tokio::test]
    async fn test_zero_or_missing_credit_is_no_credit() {
        let state = MetadataProbe::new(Arc::new(Fixed(Some(0)))).check(&server()).await;
        assert_eq!(state.health, HealthState::NoCredit);

        let state = MetadataProbe::new(Arc::new(Fixed(None))).check(&server()).await;
        assert_eq!(state.health, HealthState::NoCredit);
    }

    #[tokio::test]
    async fn test_failure_uses_configured_username() {
        let state = MetadataProbe::new(Arc::new(Failing)).check(&server()).await;
        assert_eq!(state.health, HealthState::Error);
        assert_eq!(state.username, "configured@example.com");
        assert_eq!(state.error_message.as_deref(), Some("server responded with status 503"));
    }
}
