//! Connection manager: node connect/disconnect and inbound frame routing.

use std::sync::Arc;

use tracing::{debug, info, warn};

use powertool_core::error::AppError;
use powertool_core::types::id::NodeId;

use super::runtime::NodeRuntime;
use crate::channel::bus::MessageBus;
use crate::channel::handler::Listener;
use crate::directory::directory::NodeDirectory;
use crate::message::frame::HostFrame;
use crate::message::serializer;
use crate::subscription::Subscription;

/// Sole writer of the node set.
///
/// Connecting a node attaches its bus endpoint and then mounts it, so mount
/// observers can already address it. Disconnecting detaches first, so
/// anything sent after the unmount is dropped.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Node directory.
    directory: Arc<NodeDirectory>,
    /// Message bus.
    bus: MessageBus,
    /// Host endpoint id.
    host_id: NodeId,
    /// Inbound frame size limit.
    max_frame_bytes: usize,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(
        directory: Arc<NodeDirectory>,
        bus: MessageBus,
        host_id: NodeId,
        max_frame_bytes: usize,
    ) -> Self {
        Self {
            directory,
            bus,
            host_id,
            max_frame_bytes,
        }
    }

    /// Connects and mounts a node.
    pub fn connect(&self, node_id: NodeId) -> Result<NodeRuntime, AppError> {
        self.connect_with(node_id, |_| {})
    }

    /// Connects a node, running `setup` (typically installing the node's
    /// reply hook) after its endpoint exists but before mount observers fire.
    pub fn connect_with<F>(&self, node_id: NodeId, setup: F) -> Result<NodeRuntime, AppError>
    where
        F: FnOnce(&NodeRuntime),
    {
        if node_id.as_str().trim().is_empty() {
            return Err(AppError::validation("Node id must not be empty"));
        }
        if node_id == self.host_id {
            return Err(AppError::validation(format!(
                "Node id '{}' is reserved for the host",
                node_id
            )));
        }
        if self.directory.contains(&node_id) {
            return Err(AppError::conflict(format!(
                "Node '{}' is already connected",
                node_id
            )));
        }

        let attachment = self.bus.attach(node_id.clone())?;

        let runtime = NodeRuntime::new(
            node_id.clone(),
            self.host_id.clone(),
            attachment,
            self.bus.clone(),
        );
        setup(&runtime);

        if let Err(e) = self.directory.mount(node_id.clone()) {
            self.bus.detach(&node_id);
            return Err(e);
        }

        info!(node_id = %node_id, "Node connected");
        Ok(runtime)
    }

    /// Disconnects and unmounts a node.
    pub fn disconnect(&self, node_id: &NodeId) -> Result<(), AppError> {
        if !self.directory.contains(node_id) {
            return Err(AppError::not_found(format!(
                "Node '{}' is not connected",
                node_id
            )));
        }

        self.bus.detach(node_id);
        self.directory.unmount(node_id);

        info!(node_id = %node_id, "Node disconnected");
        Ok(())
    }

    /// Disconnects every node. Returns how many were disconnected.
    pub fn disconnect_all(&self) -> usize {
        let nodes = self.directory.list();
        let mut count = 0;
        for node_id in &nodes {
            if self.disconnect(node_id).is_ok() {
                count += 1;
            }
        }
        if count > 0 {
            info!(count = count, "All nodes disconnected");
        }
        count
    }

    /// Decodes a raw frame from a node's transport and routes it to the host.
    pub fn handle_inbound(&self, node_id: &NodeId, raw: &str) -> Result<(), AppError> {
        if !self.directory.contains(node_id) {
            warn!(node_id = %node_id, "Frame from unknown node");
            return Err(AppError::not_found(format!(
                "Node '{}' is not connected",
                node_id
            )));
        }

        let frame = serializer::deserialize_node_frame(raw, self.max_frame_bytes).map_err(|e| {
            warn!(node_id = %node_id, error = %e, "Rejected inbound frame");
            e
        })?;

        debug!(node_id = %node_id, frame = ?frame, "Inbound frame");
        self.bus
            .route(frame.into_envelope(node_id.clone(), self.host_id.clone()));
        Ok(())
    }

    /// Forwards everything delivered to `node_id` to a transport as encoded
    /// host frames.
    pub fn bridge_outbound<S>(&self, node_id: &NodeId, sink: S) -> Result<Subscription, AppError>
    where
        S: Fn(String) + Send + Sync + 'static,
    {
        let target = node_id.clone();
        self.bus.listen(
            node_id,
            None,
            Listener::sync(move |from, receipt, _reply| {
                let frame = HostFrame::from_receipt(from, &receipt);
                match serializer::serialize_host_frame(&frame) {
                    Ok(text) => sink(text),
                    Err(e) => warn!(node_id = %target, error = %e, "Failed to encode host frame"),
                }
                None
            }),
        )
    }

    /// The node directory.
    pub fn directory(&self) -> &Arc<NodeDirectory> {
        &self.directory
    }

    /// The message bus.
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Host endpoint id.
    pub fn host_id(&self) -> &NodeId {
        &self.host_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use parking_lot::Mutex;
    use serde_json::json;
    use tokio::sync::mpsc;

    use powertool_core::config::MessagingConfig;
    use powertool_core::error::ErrorKind;
    use powertool_core::types::id::Token;

    use crate::message::types::Receipt;
    use crate::metrics::ChannelMetrics;

    fn manager() -> ConnectionManager {
        let metrics = Arc::new(ChannelMetrics::new());
        let directory = Arc::new(NodeDirectory::new(16, metrics.clone()));
        let bus = MessageBus::new(&MessagingConfig::default(), metrics);
        bus.attach(NodeId::host()).expect("attach host");
        ConnectionManager::new(directory, bus, NodeId::host(), 1024)
    }

    fn host_inbox(manager: &ConnectionManager) -> (Subscription, mpsc::UnboundedReceiver<(NodeId, Receipt)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sub = manager
            .bus()
            .listen(
                &NodeId::host(),
                None,
                Listener::sync(move |from, receipt, _| {
                    let _ = tx.send((from, receipt));
                    None
                }),
            )
            .expect("listen");
        (sub, rx)
    }

    async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out")
            .expect("closed")
    }

    #[tokio::test]
    async fn test_connect_mounts_and_disconnect_unmounts() {
        let manager = manager();
        let runtime = manager.connect(NodeId::from("A")).expect("connect");

        assert_eq!(manager.directory().list(), vec!["A"]);
        assert!(runtime.is_connected());

        manager.disconnect(&NodeId::from("A")).expect("disconnect");
        assert!(manager.directory().list().is_empty());
        assert!(!runtime.is_connected());
    }

    #[tokio::test]
    async fn test_connect_rejects_host_id_and_duplicates() {
        let manager = manager();
        let err = manager.connect(NodeId::host()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        manager.connect(NodeId::from("A")).expect("connect");
        let err = manager.connect(NodeId::from("A")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_disconnect_unknown_is_not_found() {
        let manager = manager();
        let err = manager.disconnect(&NodeId::from("ghost")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_setup_runs_before_mount_observers() {
        let manager = manager();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let observed = seen.clone();
        let bus = manager.bus().clone();
        let _sub = manager.directory().on_mount(
            None,
            Arc::new(move |id: &NodeId| {
                observed.lock().push(bus.listener_count(id));
            }),
        );

        manager
            .connect_with(NodeId::from("A"), |runtime| {
                runtime.set_reply_hook(|_, _, _| None);
            })
            .expect("connect");

        assert_eq!(*seen.lock(), vec![1]);
    }

    #[tokio::test]
    async fn test_inbound_ipc_frame_reaches_host() {
        let manager = manager();
        let (_sub, mut rx) = host_inbox(&manager);
        manager.connect(NodeId::from("A")).expect("connect");

        manager
            .handle_inbound(
                &NodeId::from("A"),
                r#"{"type":"ipc","reply":"incoming-token","payload":{"localPlayer":"bob"}}"#,
            )
            .expect("inbound");

        let (from, receipt) = recv(&mut rx).await;
        assert_eq!(from, "A");
        assert_eq!(receipt.reply_token, Some(Token::from("incoming-token")));
        assert_eq!(receipt.payload, json!({ "localPlayer": "bob" }));
    }

    #[tokio::test]
    async fn test_inbound_rejects_malformed_and_unknown() {
        let manager = manager();
        manager.connect(NodeId::from("A")).expect("connect");

        let err = manager.handle_inbound(&NodeId::from("A"), "not json").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Serialization);

        let err = manager.handle_inbound(&NodeId::from("A"), "").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = manager
            .handle_inbound(&NodeId::from("B"), r#"{"type":"ipc","payload":1}"#)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_bridge_round_trip_through_frames() {
        let manager = Arc::new(manager());
        let (_sub, mut host_rx) = host_inbox(&manager);
        manager.connect(NodeId::from("A")).expect("connect");

        let (tx, mut frames) = mpsc::unbounded_channel();
        let _bridge = manager
            .bridge_outbound(&NodeId::from("A"), move |text| {
                let _ = tx.send(text);
            })
            .expect("bridge");

        manager
            .bus()
            .send(&NodeId::host(), &NodeId::from("A"), Some(Token::from("tok1")), "hello");

        let text = recv(&mut frames).await;
        let frame: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(
            frame,
            json!({ "type": "packet", "from": "host", "token": "tok1", "payload": "hello" })
        );

        manager
            .handle_inbound(
                &NodeId::from("A"),
                r#"{"type":"reply","token":"tok1","payload":"world"}"#,
            )
            .expect("inbound reply");

        let (from, receipt) = recv(&mut host_rx).await;
        assert_eq!(from, "A");
        assert_eq!(receipt.correlation, Some(Token::from("tok1")));
        assert_eq!(receipt.payload, json!("world"));
    }

    #[tokio::test]
    async fn test_runtime_hook_replaced_and_disconnected_send_dropped() {
        let manager = manager();
        let (_sub, mut host_rx) = host_inbox(&manager);
        let runtime = manager.connect(NodeId::from("A")).expect("connect");

        assert!(runtime.set_reply_hook(|_, _, _| Some(json!("first"))));
        assert!(runtime.set_reply_hook(|_, _, _| Some(json!("second"))));
        assert_eq!(manager.bus().listener_count(&NodeId::from("A")), 1);

        manager
            .bus()
            .send(&NodeId::host(), &NodeId::from("A"), Some(Token::from("t")), json!(null));
        let (_, receipt) = recv(&mut host_rx).await;
        assert_eq!(receipt.payload, json!("second"));

        manager.disconnect(&NodeId::from("A")).expect("disconnect");
        runtime.send(None, "late");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(host_rx.try_recv().is_err());
    }
}
