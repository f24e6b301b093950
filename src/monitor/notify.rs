//! Notification bus for state changes.
//!
//! # Responsibilities
//! - Keep the ordered list of subscribed listeners
//! - Deliver `(server name, new state)` to each listener in registration order
//!
//! # Design Decisions
//! - Delivery iterates an immutable snapshot, so subscribe/unsubscribe never
//!   block on or disturb an in-flight pass
//! - A panicking listener is logged and skipped; the others still run

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use arc_swap::ArcSwap;

use crate::health::state::ServerState;
use crate::lifecycle::runner::panic_message;

/// Observer of remote server state changes.
pub trait StateListener: Send + Sync {
    fn on_remote_server_state_change(&self, server_name: &str, new_state: &ServerState);
}

impl<F> StateListener for F
where
    F: Fn(&str, &ServerState) + Send + Sync,
{
    fn on_remote_server_state_change(&self, server_name: &str, new_state: &ServerState) {
        self(server_name, new_state)
    }
}

type Listeners = Vec<Arc<dyn StateListener>>;

/// Thread-safe listener registry.
#[derive(Clone)]
pub struct NotificationBus {
    listeners: Arc<ArcSwap<Listeners>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(ArcSwap::from_pointee(Vec::new())),
        }
    }

    pub fn subscribe(&self, listener: Arc<dyn StateListener>) {
        self.listeners.rcu(|current| {
            let mut next = Listeners::clone(current);
            next.push(listener.clone());
            next
        });
    }

    /// Remove the first registration of `listener`. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, listener: &Arc<dyn StateListener>) -> bool {
        let mut removed = false;
        self.listeners.rcu(|current| {
            let mut next = Listeners::clone(current);
            removed = match next.iter().position(|l| same_listener(l, listener)) {
                Some(idx) => {
                    next.remove(idx);
                    true
                }
                None => false,
            };
            next
        });
        removed
    }

    /// Deliver one change to every listener subscribed right now.
    pub fn notify(&self, server_name: &str, new_state: &ServerState) {
        let snapshot = self.listeners.load_full();
        for listener in snapshot.iter() {
            let delivered = catch_unwind(AssertUnwindSafe(|| {
                listener.on_remote_server_state_change(server_name, new_state)
            }));
            if let Err(panic) = delivered {
                tracing::error!(
                    server = %server_name,
                    panic = %panic_message(panic.as_ref()),
                    "State listener panicked"
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

fn same_listener(a: &Arc<dyn StateListener>, b: &Arc<dyn StateListener>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
