//! Bus endpoints: one inbox and delivery task per participant.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use powertool_core::types::id::{NodeId, PluginId, SubscriptionId};

use super::bus::BusShared;
use super::handler::Listener;
use super::reply::ReplyHandle;
use crate::message::envelope::Envelope;
use crate::message::types::Payload;
use crate::metrics::ChannelMetrics;
use crate::subscription::{Subscription, Unsubscribe};

struct ListenerEntry {
    id: SubscriptionId,
    owner: Option<PluginId>,
    listener: Listener,
}

/// Listeners installed on one endpoint, in registration order.
pub struct ListenerList {
    endpoint: NodeId,
    entries: RwLock<Vec<ListenerEntry>>,
}

impl ListenerList {
    fn new(endpoint: NodeId) -> Self {
        Self {
            endpoint,
            entries: RwLock::new(Vec::new()),
        }
    }

    fn register(self: &Arc<Self>, owner: Option<PluginId>, listener: Listener) -> Subscription {
        let id = SubscriptionId::new();
        debug!(
            endpoint = %self.endpoint,
            subscription_id = %id,
            owner = ?owner,
            is_async = listener.is_async(),
            "Listener installed"
        );
        self.entries.write().push(ListenerEntry {
            id,
            owner,
            listener,
        });
        let target: Weak<dyn Unsubscribe> = Arc::downgrade(self) as Weak<dyn Unsubscribe>;
        Subscription::new(id, target)
    }

    fn remove_owner(&self, owner: &PluginId) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.owner.as_ref() != Some(owner));
        before - entries.len()
    }

    /// Listeners that should see `envelope`, with their owners.
    fn snapshot_for(
        &self,
        envelope: &Envelope,
    ) -> Vec<(SubscriptionId, Option<PluginId>, Listener)> {
        self.entries
            .read()
            .iter()
            .filter(|e| envelope.is_visible_to(e.owner.as_ref()))
            .map(|e| (e.id, e.owner.clone(), e.listener.clone()))
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

impl Unsubscribe for ListenerList {
    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() < before
    }
}

/// A participant on the bus: the host or one connected node.
pub struct Endpoint {
    /// Endpoint id.
    pub id: NodeId,
    /// When the endpoint was attached.
    pub attached_at: DateTime<Utc>,
    /// Bus-wide attachment number; a re-attached id gets a new one.
    pub attachment: u64,
    inbox: mpsc::Sender<Envelope>,
    listeners: Arc<ListenerList>,
    task: JoinHandle<()>,
}

impl Endpoint {
    /// Creates the endpoint and spawns its delivery task.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn(
        id: NodeId,
        attachment: u64,
        capacity: usize,
        bus: Weak<BusShared>,
        metrics: Arc<ChannelMetrics>,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let listeners = Arc::new(ListenerList::new(id.clone()));

        let task = tokio::spawn(run_delivery(
            id.clone(),
            rx,
            listeners.clone(),
            bus,
            metrics,
        ));

        info!(
            endpoint = %id,
            attachment = attachment,
            capacity = capacity,
            "Endpoint attached"
        );

        Arc::new(Self {
            id,
            attached_at: Utc::now(),
            attachment,
            inbox: tx,
            listeners,
            task,
        })
    }

    /// Queues an envelope without waiting.
    pub(crate) fn try_deliver(
        &self,
        envelope: Envelope,
    ) -> Result<(), mpsc::error::TrySendError<Envelope>> {
        self.inbox.try_send(envelope)
    }

    /// Installs a listener.
    pub(crate) fn listen(&self, owner: Option<PluginId>, listener: Listener) -> Subscription {
        self.listeners.register(owner, listener)
    }

    /// Removes every listener owned by `owner`.
    pub(crate) fn remove_listeners(&self, owner: &PluginId) -> usize {
        self.listeners.remove_owner(owner)
    }

    /// Number of installed listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Stops delivery. Anything still queued is discarded.
    pub(crate) fn close(&self) {
        self.task.abort();
        info!(endpoint = %self.id, "Endpoint detached");
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("id", &self.id)
            .field("attached_at", &self.attached_at)
            .field("attachment", &self.attachment)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Drains an endpoint inbox in arrival order.
async fn run_delivery(
    id: NodeId,
    mut rx: mpsc::Receiver<Envelope>,
    listeners: Arc<ListenerList>,
    bus: Weak<BusShared>,
    metrics: Arc<ChannelMetrics>,
) {
    while let Some(envelope) = rx.recv().await {
        let snapshot = listeners.snapshot_for(&envelope);

        if snapshot.is_empty() {
            metrics.record_unhandled();
            debug!(
                endpoint = %id,
                from = %envelope.source,
                plugin = ?envelope.plugin,
                message_id = %envelope.id,
                "No listener for envelope, dropped"
            );
            continue;
        }

        metrics.record_delivered();

        let from = envelope.source.clone();
        let receipt = envelope.to_receipt();
        let reply = ReplyHandle::new(
            bus.clone(),
            id.clone(),
            from.clone(),
            envelope.reply_token().cloned(),
            envelope.plugin.clone(),
        );

        for (subscription_id, owner, listener) in snapshot {
            let reply = reply.for_responder(owner);
            match listener {
                Listener::Sync(handler) => {
                    let outcome = catch_unwind(AssertUnwindSafe(|| {
                        handler(from.clone(), receipt.clone(), reply.clone())
                    }));
                    match outcome {
                        Ok(returned) => send_returned(&reply, returned),
                        Err(_) => {
                            metrics.record_listener_panic();
                            error!(
                                endpoint = %id,
                                from = %from,
                                subscription_id = %subscription_id,
                                "Listener panicked"
                            );
                        }
                    }
                }
                Listener::Async(handler) => {
                    let started = catch_unwind(AssertUnwindSafe(|| {
                        handler(from.clone(), receipt.clone(), reply.clone())
                    }));
                    let future = match started {
                        Ok(future) => future,
                        Err(_) => {
                            metrics.record_listener_panic();
                            error!(
                                endpoint = %id,
                                from = %from,
                                subscription_id = %subscription_id,
                                "Async listener panicked before its first poll"
                            );
                            continue;
                        }
                    };

                    let metrics = metrics.clone();
                    let endpoint = id.clone();
                    let from = from.clone();
                    tokio::spawn(async move {
                        match AssertUnwindSafe(future).catch_unwind().await {
                            Ok(returned) => send_returned(&reply, returned),
                            Err(_) => {
                                metrics.record_listener_panic();
                                error!(
                                    endpoint = %endpoint,
                                    from = %from,
                                    subscription_id = %subscription_id,
                                    "Async listener panicked"
                                );
                            }
                        }
                    });
                }
            }
        }
    }

    debug!(endpoint = %id, "Delivery loop ended");
}

/// A value returned from a listener is an implicit reply.
fn send_returned(reply: &ReplyHandle, returned: Option<Payload>) {
    if let Some(payload) = returned {
        reply.reply(payload);
    }
}
