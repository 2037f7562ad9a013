//! Callback observers for node transitions.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, error};

use powertool_core::types::id::{NodeId, PluginId, SubscriptionId};

use crate::subscription::{Subscription, Unsubscribe};

/// Callback invoked with the id of the node that changed state.
pub type NodeCallback = Arc<dyn Fn(&NodeId) + Send + Sync>;

struct ObserverEntry {
    id: SubscriptionId,
    owner: Option<PluginId>,
    callback: NodeCallback,
}

/// Ordered list of observers for one kind of transition.
///
/// Observers run in registration order. The list lock is never held while a
/// callback runs, so a callback may register or cancel observers.
pub struct ObserverList {
    /// Transition name used in logs (`"mount"` / `"unmount"`).
    kind: &'static str,
    entries: RwLock<Vec<ObserverEntry>>,
}

impl ObserverList {
    /// Creates an empty observer list.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Appends an observer and returns its cancellation handle.
    pub fn register(
        self: &Arc<Self>,
        owner: Option<PluginId>,
        callback: NodeCallback,
    ) -> Subscription {
        let id = SubscriptionId::new();
        self.entries.write().push(ObserverEntry {
            id,
            owner: owner.clone(),
            callback,
        });

        debug!(
            kind = self.kind,
            subscription_id = %id,
            owner = ?owner,
            "Node observer registered"
        );

        let target: Weak<dyn Unsubscribe> = Arc::downgrade(self) as Weak<dyn Unsubscribe>;
        Subscription::new(id, target)
    }

    /// Removes every observer owned by `owner`. Returns how many were removed.
    pub fn remove_owner(&self, owner: &PluginId) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.owner.as_ref() != Some(owner));
        before - entries.len()
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no observers are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Invokes every observer with `node_id`, isolating panics.
    ///
    /// Returns the number of observers that panicked.
    pub fn notify(&self, node_id: &NodeId) -> usize {
        let snapshot: Vec<(SubscriptionId, Option<PluginId>, NodeCallback)> = self
            .entries
            .read()
            .iter()
            .map(|e| (e.id, e.owner.clone(), e.callback.clone()))
            .collect();

        let mut panicked = 0;
        for (id, owner, callback) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(node_id))).is_err() {
                panicked += 1;
                error!(
                    kind = self.kind,
                    node_id = %node_id,
                    subscription_id = %id,
                    owner = ?owner,
                    "Node observer panicked"
                );
            }
        }
        panicked
    }
}

impl Unsubscribe for ObserverList {
    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() < before
    }
}

impl std::fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverList")
            .field("kind", &self.kind)
            .field("len", &self.len())
            .finish()
    }
}
