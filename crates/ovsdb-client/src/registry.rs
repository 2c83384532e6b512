//! Routing of notifications from a connection to its owning session
//!
//! Every session registers its handler slot under a [`ConnectionId`] when it
//! is created and removes it during teardown. The dispatch loop of a
//! connection looks the slot up on every inbound notification, so lookups
//! take a read lock and only registration takes the write lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::notification::{Notification, NotificationHandler};

/// Identifies one connection within a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// The notification handler of a session; replaceable at any time
pub(crate) type HandlerSlot = Arc<RwLock<Arc<dyn NotificationHandler>>>;

#[derive(Default)]
struct RegistryInner {
    next_id: AtomicU64,
    sessions: RwLock<HashMap<ConnectionId, HandlerSlot>>,
}

/// Maps live connections to the handler of the session that owns them.
///
/// Cloning yields another handle to the same registry. Sessions created
/// without an explicit registry get a private one.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, slot: HandlerSlot) -> ConnectionId {
        let id = ConnectionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, slot);
        debug!("Registered session for {}", id);
        id
    }

    pub(crate) fn deregister(&self, id: ConnectionId) -> bool {
        let removed = self
            .inner
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        if removed {
            debug!("Deregistered session for {}", id);
        }
        removed
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `notification` to the handler of the session owning `id`.
    ///
    /// Returns false if no session is registered for `id`.
    pub fn dispatch(&self, id: ConnectionId, notification: &Notification) -> bool {
        let slot = {
            let sessions = self
                .inner
                .sessions
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match sessions.get(&id) {
                Some(slot) => Arc::clone(slot),
                None => return false,
            }
        };
        let handler = Arc::clone(&*slot.read().unwrap_or_else(PoisonError::into_inner));
        if let Err(e) = notification.deliver(handler.as_ref()) {
            warn!("{} handler for {} failed: {:#}", notification.method(), id, e);
        }
        true
    }
}

pub(crate) fn handler_slot(handler: Arc<dyn NotificationHandler>) -> HandlerSlot {
    Arc::new(RwLock::new(handler))
}
