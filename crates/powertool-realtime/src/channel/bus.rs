//! Message bus: routes envelopes between attached endpoints.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use powertool_core::config::MessagingConfig;
use powertool_core::error::AppError;
use powertool_core::types::id::{NodeId, PluginId, Token};

use super::endpoint::Endpoint;
use super::handler::Listener;
use crate::message::envelope::Envelope;
use crate::message::types::Payload;
use crate::message::validator;
use crate::metrics::ChannelMetrics;
use crate::subscription::Subscription;

/// State shared between the bus, its endpoints, and outstanding reply handles.
pub(crate) struct BusShared {
    /// Endpoint id → endpoint.
    endpoints: DashMap<NodeId, Arc<Endpoint>>,
    /// (source, target) → next sequence number.
    sequences: DashMap<(NodeId, NodeId), u64>,
    /// Counters.
    pub(crate) metrics: Arc<ChannelMetrics>,
    /// Per-endpoint inbox capacity.
    inbox_capacity: usize,
    /// Maximum encoded payload size.
    max_payload_bytes: usize,
    /// Next attachment number.
    next_attachment: AtomicU64,
}

impl BusShared {
    /// Routes an envelope to its target. Never fails; drops are logged and counted.
    pub(crate) fn route(&self, mut envelope: Envelope) {
        if let Err(e) = validator::validate_payload_size(&envelope.payload, self.max_payload_bytes) {
            self.metrics.record_oversize();
            warn!(
                from = %envelope.source,
                to = %envelope.target,
                error = %e,
                "Envelope dropped: payload too large"
            );
            return;
        }

        let endpoint = match self.endpoints.get(&envelope.target) {
            Some(entry) => entry.value().clone(),
            None => {
                self.metrics.record_undeliverable();
                debug!(
                    from = %envelope.source,
                    to = %envelope.target,
                    kind = ?envelope.kind,
                    "Envelope dropped: target not connected"
                );
                return;
            }
        };

        // Hold the pair's sequence slot while queueing so seq order matches inbox order.
        let key = (envelope.source.clone(), envelope.target.clone());
        let mut next_seq = self.sequences.entry(key).or_insert(0);
        envelope.seq = *next_seq;

        let message_id = envelope.id;
        match endpoint.try_deliver(envelope) {
            Ok(()) => {
                *next_seq += 1;
                self.metrics.record_sent();
            }
            Err(TrySendError::Full(dropped)) => {
                self.metrics.record_overflow();
                warn!(
                    from = %dropped.source,
                    to = %dropped.target,
                    message_id = %message_id,
                    "Envelope dropped: inbox full"
                );
            }
            Err(TrySendError::Closed(dropped)) => {
                self.metrics.record_undeliverable();
                debug!(
                    from = %dropped.source,
                    to = %dropped.target,
                    message_id = %message_id,
                    "Envelope dropped: endpoint closed"
                );
            }
        }
    }
}

/// Best-effort request/reply transport between the host and nodes.
///
/// Cheap to clone; clones share the same endpoints.
#[derive(Clone)]
pub struct MessageBus {
    shared: Arc<BusShared>,
}

impl MessageBus {
    /// Creates a bus with no endpoints attached.
    pub fn new(config: &MessagingConfig, metrics: Arc<ChannelMetrics>) -> Self {
        Self {
            shared: Arc::new(BusShared {
                endpoints: DashMap::new(),
                sequences: DashMap::new(),
                metrics,
                inbox_capacity: config.inbox_capacity,
                max_payload_bytes: config.max_payload_bytes,
                next_attachment: AtomicU64::new(1),
            }),
        }
    }

    /// Attaches an endpoint and starts its delivery task.
    ///
    /// Returns the attachment number, which is never reused by this bus even
    /// when the same id is attached again later.
    ///
    /// Must be called from within a tokio runtime.
    pub fn attach(&self, id: NodeId) -> Result<u64, AppError> {
        match self.shared.endpoints.entry(id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AppError::conflict(format!(
                "Endpoint '{}' is already attached",
                id
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let attachment = self.shared.next_attachment.fetch_add(1, Ordering::Relaxed);
                slot.insert(Endpoint::spawn(
                    id,
                    attachment,
                    self.shared.inbox_capacity,
                    Arc::downgrade(&self.shared),
                    self.shared.metrics.clone(),
                ));
                Ok(attachment)
            }
        }
    }

    /// Detaches an endpoint. Queued envelopes and later sends to it are dropped.
    pub fn detach(&self, id: &NodeId) -> bool {
        let Some((_, endpoint)) = self.shared.endpoints.remove(id) else {
            return false;
        };
        endpoint.close();
        self.shared
            .sequences
            .retain(|(source, target), _| source != id && target != id);
        true
    }

    /// Whether an endpoint is attached.
    pub fn is_attached(&self, id: &NodeId) -> bool {
        self.shared.endpoints.contains_key(id)
    }

    /// Attachment number of the endpoint currently attached under `id`.
    pub fn attachment(&self, id: &NodeId) -> Option<u64> {
        self.shared.endpoints.get(id).map(|e| e.value().attachment)
    }

    /// Attached endpoint ids (unordered).
    pub fn endpoints(&self) -> Vec<NodeId> {
        self.shared
            .endpoints
            .iter()
            .map(|e| e.key().clone())
            .collect()
    }

    /// Fire-and-forget request from `from` to `to`.
    ///
    /// With a token the receiver may reply once. Returns nothing and never
    /// fails: an unknown target, full inbox, or oversize payload drops the
    /// envelope.
    pub fn send(&self, from: &NodeId, to: &NodeId, token: Option<Token>, payload: impl Into<Payload>) {
        let envelope = Envelope::request(from.clone(), to.clone(), token, payload.into());
        self.shared.route(envelope);
    }

    /// Request sent by a host plugin through the `from` endpoint.
    ///
    /// The receiver sees the plugin id, and a reply is delivered only to
    /// listeners owned by `plugin`, so tokens only need to be unique per plugin.
    pub fn send_as_plugin(
        &self,
        from: &NodeId,
        plugin: &PluginId,
        to: &NodeId,
        token: Option<Token>,
        payload: impl Into<Payload>,
    ) {
        let envelope = Envelope::request(from.clone(), to.clone(), token, payload.into())
            .with_plugin(Some(plugin.clone()));
        self.shared.route(envelope);
    }

    /// Like [`MessageBus::send`], but only while `from` is still the endpoint
    /// with the given attachment number.
    ///
    /// Returns `false`, counting the envelope as undeliverable, when `from`
    /// was detached or re-attached since.
    pub fn send_attached(
        &self,
        from: &NodeId,
        attachment: u64,
        to: &NodeId,
        token: Option<Token>,
        payload: impl Into<Payload>,
    ) -> bool {
        if self.attachment(from) != Some(attachment) {
            self.shared.metrics.record_undeliverable();
            debug!(
                from = %from,
                to = %to,
                attachment = attachment,
                "Envelope dropped: sender attachment is gone"
            );
            return false;
        }
        self.send(from, to, token, payload);
        true
    }

    /// Routes a prepared envelope.
    pub fn route(&self, envelope: Envelope) {
        self.shared.route(envelope);
    }

    /// Installs a listener on an attached endpoint.
    pub fn listen(
        &self,
        endpoint: &NodeId,
        owner: Option<PluginId>,
        listener: Listener,
    ) -> Result<Subscription, AppError> {
        let entry = self
            .shared
            .endpoints
            .get(endpoint)
            .ok_or_else(|| AppError::not_found(format!("Endpoint '{}' is not attached", endpoint)))?;
        Ok(entry.value().listen(owner, listener))
    }

    /// Removes every listener owned by a plugin, on every endpoint.
    pub fn remove_listeners(&self, owner: &PluginId) -> usize {
        self.shared
            .endpoints
            .iter()
            .map(|e| e.value().remove_listeners(owner))
            .sum()
    }

    /// Number of listeners on an endpoint (0 when not attached).
    pub fn listener_count(&self, endpoint: &NodeId) -> usize {
        self.shared
            .endpoints
            .get(endpoint)
            .map(|e| e.value().listener_count())
            .unwrap_or(0)
    }

    /// Shared counters.
    pub fn metrics(&self) -> &Arc<ChannelMetrics> {
        &self.shared.metrics
    }

    /// Detaches every endpoint.
    pub fn shutdown(&self) {
        let ids = self.endpoints();
        for id in &ids {
            self.detach(id);
        }
        debug!(count = ids.len(), "Message bus shut down");
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus")
            .field("endpoints", &self.shared.endpoints.len())
            .finish()
    }
}
