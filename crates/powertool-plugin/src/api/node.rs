//! `node` namespace of the plugin context.

use powertool_core::types::id::NodeId;
use powertool_realtime::{NodeEventStream, NodeInfo, NodeView, Subscription};

/// Read and subscribe access to the connected node set.
///
/// Observers registered here belong to the plugin and are removed when it
/// unloads.
#[derive(Debug, Clone)]
pub struct NodeApi {
    view: NodeView,
}

impl NodeApi {
    pub(crate) fn new(view: NodeView) -> Self {
        Self { view }
    }

    /// Node ids connected right now, in mount order.
    ///
    /// The result is a snapshot; it does not follow later mounts/unmounts.
    pub fn list(&self) -> Vec<NodeId> {
        self.view.list()
    }

    /// Full node records connected right now.
    pub fn nodes(&self) -> Vec<NodeInfo> {
        self.view.nodes()
    }

    /// Whether a node is connected right now.
    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.view.contains(node_id)
    }

    /// Calls `callback` for every future mount.
    pub fn on_mount<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&NodeId) + Send + Sync + 'static,
    {
        self.view.on_mount(callback)
    }

    /// Calls `callback` for every future unmount.
    pub fn on_unmount<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&NodeId) + Send + Sync + 'static,
    {
        self.view.on_unmount(callback)
    }

    /// Opens a stream of future mount/unmount events.
    pub fn subscribe(&self) -> NodeEventStream {
        self.view.subscribe()
    }
}
