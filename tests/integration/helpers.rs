//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use powertool_core::config::AppConfig;
use powertool_core::types::id::NodeId;
use powertool_plugin::notify::MemoryNotifier;
use powertool_plugin::{Plugin, PluginContext, PluginInfo, PowertoolHost};
use powertool_realtime::{NodeRuntime, Payload, Receipt};

/// Test host context
pub struct TestHost {
    /// The host under test
    pub host: PowertoolHost,
    /// Notifications raised by plugins
    pub notifier: Arc<MemoryNotifier>,
}

impl TestHost {
    /// Create a host with default configuration
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a host with the given configuration
    pub fn with_config(config: AppConfig) -> Self {
        let notifier = Arc::new(MemoryNotifier::new());
        let host =
            PowertoolHost::with_notifier(config, notifier.clone()).expect("Failed to boot host");
        Self { host, notifier }
    }

    /// Connect a node whose reply hook records every receipt.
    ///
    /// With `answer` set, the node replies to every reply-enabled packet.
    pub fn recording_node(
        &self,
        node_id: &str,
        answer: Option<&'static str>,
    ) -> (NodeRuntime, mpsc::UnboundedReceiver<Receipt>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = self
            .host
            .connect_node_with(node_id, move |runtime| {
                runtime.set_reply_hook(move |_from, receipt, reply| {
                    if let Some(answer) = answer.filter(|_| receipt.wants_reply()) {
                        reply.reply(answer);
                    }
                    let _ = tx.send(receipt);
                    None
                });
            })
            .expect("Failed to connect node");
        (runtime, rx)
    }
}

/// Receive with a timeout
pub async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("Timed out waiting for message")
        .expect("Channel closed")
}

/// Assert nothing arrives for a short while
pub async fn assert_silent<T: fmt::Debug>(rx: &mut mpsc::UnboundedReceiver<T>) {
    let waited = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(waited.is_err(), "Unexpected message: {:?}", waited);
}

type LoadFn = dyn Fn(&PluginContext) -> Result<(), String> + Send + Sync;

/// Plugin whose `on_load` is a closure
pub struct ScriptedPlugin {
    id: String,
    on_load: Arc<LoadFn>,
}

impl ScriptedPlugin {
    /// Create a plugin with the given id and load behaviour
    pub fn new<F>(id: &str, on_load: F) -> Arc<Self>
    where
        F: Fn(&PluginContext) -> Result<(), String> + Send + Sync + 'static,
    {
        Arc::new(Self {
            id: id.to_string(),
            on_load: Arc::new(on_load),
        })
    }
}

impl fmt::Debug for ScriptedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedPlugin").field("id", &self.id).finish()
    }
}

#[async_trait]
impl Plugin for ScriptedPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new(self.id.as_str(), self.id.as_str(), "0.1.0")
    }

    async fn on_load(&self, ctx: &PluginContext) -> Result<(), String> {
        (self.on_load)(ctx)
    }
}

/// Shorthand for a node id
pub fn node(id: &str) -> NodeId {
    NodeId::from(id)
}

/// Payload as a plain string, if it is one
pub fn text(payload: &Payload) -> Option<&str> {
    payload.as_str()
}
