//! Configured server list.

use std::sync::Arc;

use crate::config::schema::ServerConfig;

/// Immutable, ordered list of configured servers.
///
/// Lookup by name is case-insensitive. An empty name never matches.
#[derive(Debug, Clone, Default)]
pub struct ServerRegistry {
    servers: Arc<[ServerConfig]>,
}

impl ServerRegistry {
    pub fn new(servers: Vec<ServerConfig>) -> Self {
        Self {
            servers: servers.into(),
        }
    }

    /// All servers in configuration order.
    pub fn list(&self) -> &[ServerConfig] {
        &self.servers
    }

    pub fn lookup(&self, name: &str) -> Option<&ServerConfig> {
        if name.is_empty() {
            return None;
        }
        let wanted = name.to_lowercase();
        self.servers
            .iter()
            .filter(|server| !server.name.is_empty())
            .find(|server| server.name.to_lowercase() == wanted)
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
