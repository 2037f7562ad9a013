//! `lua` namespace of the plugin context: messaging with node-side scripts.

use std::future::Future;

use tracing::debug;

use powertool_core::error::AppError;
use powertool_core::types::id::{NodeId, PluginId, Token};
use powertool_realtime::{Listener, MessageBus, NodeView, Payload, Receipt, ReplyHandle, Subscription};

/// Best-effort request/reply with node-side scripts.
///
/// Packets are sent on behalf of the owning plugin: the node sees its id,
/// and replies come back to this plugin's listeners only. Nothing here
/// reports delivery failures: sending to a node that is gone, or that never
/// installed a reply hook, silently drops the packet.
#[derive(Debug, Clone)]
pub struct LuaApi {
    plugin_id: PluginId,
    host_id: NodeId,
    bus: MessageBus,
    nodes: NodeView,
}

impl LuaApi {
    pub(crate) fn new(plugin_id: PluginId, host_id: NodeId, bus: MessageBus, nodes: NodeView) -> Self {
        Self {
            plugin_id,
            host_id,
            bus,
            nodes,
        }
    }

    /// Sends a reply-enabled packet to a node. The node may answer once,
    /// echoing `token`; tokens only need to be unique within this plugin.
    pub fn send(&self, node_id: &NodeId, token: impl Into<Token>, payload: impl Into<Payload>) {
        let token = token.into();
        debug!(
            plugin_id = %self.plugin_id,
            node_id = %node_id,
            token = %token,
            "Sending packet"
        );
        self.bus
            .send_as_plugin(&self.host_id, &self.plugin_id, node_id, Some(token), payload);
    }

    /// Sends the same reply-enabled packet to every node in `node().list()`.
    ///
    /// Returns how many nodes were addressed.
    pub fn broadcast(&self, token: impl Into<Token>, payload: impl Into<Payload>) -> usize {
        let token = token.into();
        let payload = payload.into();
        let nodes = self.nodes.list();
        for node_id in &nodes {
            self.send(node_id, token.clone(), payload.clone());
        }
        nodes.len()
    }

    /// Handles every packet from any node, and the replies to this plugin's
    /// own packets.
    ///
    /// The handler runs on the host's delivery task; returning `Some(value)`
    /// replies with `value` unless the handler already called `reply`.
    pub fn listen<F>(&self, handler: F) -> Result<Subscription, AppError>
    where
        F: Fn(NodeId, Receipt, ReplyHandle) -> Option<Payload> + Send + Sync + 'static,
    {
        self.install(Listener::sync(handler))
    }

    /// Like [`LuaApi::listen`], but the handler may await. Each invocation is
    /// spawned, so a slow handler does not hold up later packets.
    pub fn listen_async<F, Fut>(&self, handler: F) -> Result<Subscription, AppError>
    where
        F: Fn(NodeId, Receipt, ReplyHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<Payload>> + Send + 'static,
    {
        self.install(Listener::from_async(handler))
    }

    fn install(&self, listener: Listener) -> Result<Subscription, AppError> {
        self.bus
            .listen(&self.host_id, Some(self.plugin_id.clone()), listener)
    }
}
