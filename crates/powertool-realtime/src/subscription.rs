//! Cancellation handles for observer and listener registrations.

use std::fmt;
use std::sync::Weak;

use powertool_core::types::id::SubscriptionId;

/// Something a registration can be removed from.
pub trait Unsubscribe: Send + Sync {
    /// Removes the registration with this id. Returns `false` if it was
    /// already gone.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// Handle returned by every `on_*` / `listen*` registration.
///
/// Dropping the handle keeps the registration alive; call
/// [`Subscription::cancel`] to remove it. Registrations owned by a plugin are
/// also removed when the plugin unloads.
pub struct Subscription {
    id: SubscriptionId,
    target: Weak<dyn Unsubscribe>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, target: Weak<dyn Unsubscribe>) -> Self {
        Self { id, target }
    }

    /// The id of the registration.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Removes the registration. Returns `false` if it was already removed
    /// (plugin unloaded, host shut down, or cancelled twice via a copy).
    pub fn cancel(self) -> bool {
        match self.target.upgrade() {
            Some(target) => target.unsubscribe(self.id),
            None => false,
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
