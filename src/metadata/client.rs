//! Account metadata client.
//!
//! # Responsibilities
//! - Fetch identity, display name, credit and confirmation flag for an account
//! - Authenticate through the connection factory per the server's security mode

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use url::Url;

use crate::config::schema::ServerConfig;
use crate::metadata::types::{AccountInfo, MetadataError, MetadataResult};
use crate::net::{ConnectionError, ConnectionFactory, ServerClient};

/// Source of account metadata for a server.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch_account(&self, server: &ServerConfig) -> MetadataResult<AccountInfo>;
}

/// REST implementation: one authenticated GET of the metadata path.
///
/// Clients are built once per server and reused, so a CAS ticket-granting
/// ticket survives from one probe to the next.
#[derive(Debug, Clone)]
pub struct RestMetadataClient {
    factory: ConnectionFactory,
    path: String,
    clients: Arc<DashMap<String, Arc<ServerClient>>>,
}

impl RestMetadataClient {
    pub fn new(factory: ConnectionFactory, path: impl Into<String>) -> Self {
        Self {
            factory,
            path: path.into(),
            clients: Arc::new(DashMap::new()),
        }
    }

    fn client_for(&self, server: &ServerConfig) -> MetadataResult<Arc<ServerClient>> {
        if let Some(client) = self.clients.get(&server.name) {
            return Ok(client.value().clone());
        }

        let client = Arc::new(self.factory.build_client(server, &server.url)?);
        Ok(self
            .clients
            .entry(server.name.clone())
            .or_insert(client)
            .value()
            .clone())
    }

    fn metadata_url(&self, server: &ServerConfig) -> MetadataResult<Url> {
        let text = format!(
            "{}/{}",
            server.url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        Url::parse(&text).map_err(|_| MetadataError::from(ConnectionError::InvalidUrl(text)))
    }
}

#[async_trait]
impl MetadataSource for RestMetadataClient {
    async fn fetch_account(&self, server: &ServerConfig) -> MetadataResult<AccountInfo> {
        let client = self.client_for(server)?;
        let url = self.metadata_url(server)?;

        tracing::debug!(server = %server.name, url = %url, "Fetching account metadata");
        let response = client.get(url).await?;

        response
            .json::<AccountInfo>()
            .await
            .map_err(|e| MetadataError::Decode(e.to_string()))
    }
}
