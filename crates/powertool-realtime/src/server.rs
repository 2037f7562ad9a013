//! Top-level real-time engine that ties the directory, bus and connections together.

use std::sync::Arc;

use tracing::info;

use powertool_core::config::AppConfig;
use powertool_core::error::AppError;
use powertool_core::types::id::{NodeId, PluginId};

use crate::channel::bus::MessageBus;
use crate::connection::manager::ConnectionManager;
use crate::directory::directory::{NodeDirectory, NodeView};
use crate::metrics::ChannelMetrics;

/// Central engine owning the node set and the message bus.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Node directory.
    pub directory: Arc<NodeDirectory>,
    /// Message bus.
    pub bus: MessageBus,
    /// Connection manager (sole node-set writer).
    pub connections: Arc<ConnectionManager>,
    /// Metrics collector.
    pub metrics: Arc<ChannelMetrics>,
    /// Host endpoint id.
    host_id: NodeId,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("host_id", &self.host_id)
            .field("nodes", &self.directory.len())
            .finish()
    }
}

impl RealtimeEngine {
    /// Creates the engine and attaches the host endpoint.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let host_id = NodeId::new(config.host.node_id.clone());
        let metrics = Arc::new(ChannelMetrics::new());
        let directory = Arc::new(NodeDirectory::new(
            config.messaging.event_buffer_size,
            metrics.clone(),
        ));
        let bus = MessageBus::new(&config.messaging, metrics.clone());
        bus.attach(host_id.clone())?;

        let connections = Arc::new(ConnectionManager::new(
            directory.clone(),
            bus.clone(),
            host_id.clone(),
            config.messaging.max_frame_bytes,
        ));

        info!(host_id = %host_id, "Real-time engine initialized");

        Ok(Self {
            directory,
            bus,
            connections,
            metrics,
            host_id,
        })
    }

    /// Host endpoint id.
    pub fn host_id(&self) -> &NodeId {
        &self.host_id
    }

    /// A directory view whose registrations belong to `owner`.
    pub fn view(&self, owner: PluginId) -> NodeView {
        NodeView::owned_by(self.directory.clone(), owner)
    }

    /// Disconnects every node and detaches the host endpoint.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        self.connections.disconnect_all();
        self.bus.shutdown();
        info!("Real-time engine shut down");
    }
}
