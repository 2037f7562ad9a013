//! Node directory: single-writer registry of mounted nodes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info};

use powertool_core::error::AppError;
use powertool_core::events::NodeEvent;
use powertool_core::types::id::{NodeId, PluginId};

use super::node::NodeInfo;
use super::observers::{NodeCallback, ObserverList};
use super::stream::NodeEventStream;
use crate::metrics::ChannelMetrics;
use crate::subscription::Subscription;

/// Live set of connected nodes.
///
/// Only the connection subsystem mutates the set (`mount` / `unmount` are
/// crate-private and reached through `ConnectionManager`). Plugins get a
/// [`NodeView`] with read and subscribe access.
#[derive(Debug)]
pub struct NodeDirectory {
    /// Node id → record.
    nodes: DashMap<NodeId, NodeInfo>,
    /// Mount order counter.
    next_seq: AtomicU64,
    /// Serializes transitions so observers see them in the order they happen.
    transition: Mutex<()>,
    /// Mount observers.
    on_mount: Arc<ObserverList>,
    /// Unmount observers.
    on_unmount: Arc<ObserverList>,
    /// Event stream fan-out.
    events: broadcast::Sender<NodeEvent>,
    /// Shared counters.
    metrics: Arc<ChannelMetrics>,
}

impl NodeDirectory {
    /// Creates an empty directory.
    pub fn new(event_buffer_size: usize, metrics: Arc<ChannelMetrics>) -> Self {
        let (events, _) = broadcast::channel(event_buffer_size.max(1));
        Self {
            nodes: DashMap::new(),
            next_seq: AtomicU64::new(0),
            transition: Mutex::new(()),
            on_mount: Arc::new(ObserverList::new("mount")),
            on_unmount: Arc::new(ObserverList::new("unmount")),
            events,
            metrics,
        }
    }

    /// Adds a node and notifies observers.
    ///
    /// Fails with `Conflict` if the id is currently mounted.
    pub(crate) fn mount(&self, node_id: NodeId) -> Result<NodeInfo, AppError> {
        let _guard = self.transition.lock();

        if self.nodes.contains_key(&node_id) {
            return Err(AppError::conflict(format!(
                "Node '{}' is already mounted",
                node_id
            )));
        }

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let info = NodeInfo::connected(node_id.clone(), seq);
        self.nodes.insert(node_id.clone(), info.clone());
        self.metrics.record_mount();

        info!(node_id = %node_id, seq = seq, "Node mounted");

        // Stream consumers may be absent; a send error only means no receivers.
        let _ = self.events.send(NodeEvent::mounted(node_id.clone()));
        self.on_mount.notify(&node_id);

        Ok(info)
    }

    /// Removes a node and notifies observers.
    ///
    /// Returns `false` (and notifies nobody) if the node was not mounted.
    pub(crate) fn unmount(&self, node_id: &NodeId) -> bool {
        let _guard = self.transition.lock();

        if self.nodes.remove(node_id).is_none() {
            debug!(node_id = %node_id, "Unmount of unknown node ignored");
            return false;
        }
        self.metrics.record_unmount();

        info!(node_id = %node_id, "Node unmounted");

        let _ = self.events.send(NodeEvent::unmounted(node_id.clone()));
        self.on_unmount.notify(node_id);

        true
    }

    /// Snapshot of mounted node ids, in mount order.
    pub fn list(&self) -> Vec<NodeId> {
        self.nodes().into_iter().map(|n| n.node_id).collect()
    }

    /// Snapshot of mounted node records, in mount order.
    pub fn nodes(&self) -> Vec<NodeInfo> {
        let mut nodes: Vec<NodeInfo> = self.nodes.iter().map(|e| e.value().clone()).collect();
        nodes.sort_by_key(|n| n.seq);
        nodes
    }

    /// Looks up a single node.
    pub fn get(&self, node_id: &NodeId) -> Option<NodeInfo> {
        self.nodes.get(node_id).map(|e| e.value().clone())
    }

    /// Whether the node is currently mounted.
    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Number of mounted nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no node is mounted.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Registers a mount observer.
    pub fn on_mount(&self, owner: Option<PluginId>, callback: NodeCallback) -> Subscription {
        self.on_mount.register(owner, callback)
    }

    /// Registers an unmount observer.
    pub fn on_unmount(&self, owner: Option<PluginId>, callback: NodeCallback) -> Subscription {
        self.on_unmount.register(owner, callback)
    }

    /// Opens a new event stream starting now.
    pub fn subscribe(&self) -> NodeEventStream {
        NodeEventStream::new(self.events.subscribe())
    }

    /// Drops every observer owned by a plugin.
    pub fn remove_observers(&self, owner: &PluginId) -> usize {
        self.on_mount.remove_owner(owner) + self.on_unmount.remove_owner(owner)
    }
}

/// Read/subscribe view of the directory handed to plugins.
#[derive(Debug, Clone)]
pub struct NodeView {
    directory: Arc<NodeDirectory>,
    owner: Option<PluginId>,
}

impl NodeView {
    /// Creates an unowned view (host-side observers).
    pub fn new(directory: Arc<NodeDirectory>) -> Self {
        Self {
            directory,
            owner: None,
        }
    }

    /// Creates a view whose registrations are tagged with a plugin.
    pub fn owned_by(directory: Arc<NodeDirectory>, owner: PluginId) -> Self {
        Self {
            directory,
            owner: Some(owner),
        }
    }

    /// Snapshot of mounted node ids, valid only at call time.
    pub fn list(&self) -> Vec<NodeId> {
        self.directory.list()
    }

    /// Snapshot of mounted node records.
    pub fn nodes(&self) -> Vec<NodeInfo> {
        self.directory.nodes()
    }

    /// Whether a node is currently mounted.
    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.directory.contains(node_id)
    }

    /// Calls `callback` once per future mount.
    pub fn on_mount<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&NodeId) + Send + Sync + 'static,
    {
        self.directory
            .on_mount(self.owner.clone(), Arc::new(callback))
    }

    /// Calls `callback` once per future unmount.
    pub fn on_unmount<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&NodeId) + Send + Sync + 'static,
    {
        self.directory
            .on_unmount(self.owner.clone(), Arc::new(callback))
    }

    /// Opens an independent stream of future transitions.
    pub fn subscribe(&self) -> NodeEventStream {
        self.directory.subscribe()
    }
}
