//! In-process change notification for registries

use std::sync::{Arc, Mutex, PoisonError};

/// Change applied to a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A record was created
    Added(String),
    /// A record was overwritten
    Updated(String),
    /// A record was removed
    Deleted(String),
    /// Every record was removed
    Cleared,
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&RegistryEvent) + Send + Sync>;

#[derive(Default)]
struct ListenerSet {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

/// Ordered list of listeners, invoked synchronously in subscription order
#[derive(Default)]
pub(super) struct Listeners {
    inner: Mutex<ListenerSet>,
}

impl Listeners {
    pub(super) fn add<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&RegistryEvent) + Send + Sync + 'static,
    {
        let mut set = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = SubscriptionId(set.next_id);
        set.next_id += 1;
        set.listeners.push((id, Arc::new(listener)));
        id
    }

    pub(super) fn remove(&self, id: SubscriptionId) -> bool {
        let mut set = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = set.listeners.len();
        set.listeners.retain(|(existing, _)| *existing != id);
        set.listeners.len() != before
    }

    pub(super) fn notify(&self, event: &RegistryEvent) {
        // Snapshot so listeners may subscribe or unsubscribe re-entrantly
        let snapshot: Vec<Listener> = {
            let set = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            set.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in snapshot {
            listener(event);
        }
    }
}
