//! Last-known state per server.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::config::schema::ServerConfig;
use crate::health::state::ServerState;

/// A thread-safe map of server name -> last observed state.
///
/// Readers get cloned snapshots; the scheduler is the only writer and replaces
/// values atomically per key.
#[derive(Clone, Default)]
pub struct StateStore {
    inner: Arc<DashMap<String, ServerState>>,
}

impl StateStore {
    /// Seed one `NotConnected` entry per configured server.
    pub fn new(servers: &[ServerConfig]) -> Self {
        let inner = DashMap::with_capacity(servers.len());
        for server in servers {
            inner.insert(server.name.clone(), ServerState::not_connected(&server.username));
        }
        Self { inner: Arc::new(inner) }
    }

    pub fn get(&self, name: &str) -> Option<ServerState> {
        self.inner.get(name).map(|r| r.value().clone())
    }

    /// Store `state` unless it equals the current value. Returns true when it changed.
    ///
    /// A missing previous value counts as a change.
    pub fn replace_if_changed(&self, name: &str, state: ServerState) -> bool {
        match self.inner.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() == state {
                    false
                } else {
                    entry.insert(state);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(state);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
