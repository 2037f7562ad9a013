//! Clear-tab plugin registered with the Powertool plugin system.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

use powertool_plugin::prelude::*;

use crate::hooks::{self, EditorCache};
use crate::packets::{self, GREETING_PAYLOAD, GREETING_TOKEN};

/// Plugin id.
pub const PLUGIN_ID: &str = "clear-tab";

/// The example powertool.
#[derive(Debug, Default)]
pub struct ClearTabPlugin {
    /// Editors seen through `editor.onCreate`.
    editors: EditorCache,
}

impl ClearTabPlugin {
    /// Create a new clear-tab plugin
    pub fn new() -> Self {
        Self {
            editors: Arc::new(DashMap::new()),
        }
    }
}

#[async_trait]
impl Plugin for ClearTabPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo::new(PLUGIN_ID, "Clear Tab", env!("CARGO_PKG_VERSION"))
            .with_description("Clear-tab context action, mood toolbar, node greeting")
            .with_author("Powertool")
    }

    async fn on_load(&self, ctx: &PluginContext) -> Result<(), String> {
        info!(plugin_id = %ctx.id(), "Welcome from {}.", ctx.name());

        ctx.register_hooks(hooks::hook_set(self.editors.clone()));

        let plugin_id = ctx.id().clone();
        ctx.node().on_mount(move |node_id| {
            info!(plugin_id = %plugin_id, node_id = %node_id, "Node {} has connected!", node_id);
        });
        let plugin_id = ctx.id().clone();
        ctx.node().on_unmount(move |node_id| {
            info!(plugin_id = %plugin_id, node_id = %node_id, "Node {} has disconnected!", node_id);
        });

        info!(plugin_id = %ctx.id(), nodes = ?ctx.node().list(), "Nodes available at load");

        ctx.lua()
            .listen(packets::handle_packet)
            .map_err(|e| format!("Failed to listen for node packets: {e}"))?;

        let greeted = ctx.lua().broadcast(GREETING_TOKEN, GREETING_PAYLOAD);
        info!(plugin_id = %ctx.id(), nodes = greeted, "Greeting sent");

        Ok(())
    }

    async fn on_unload(&self, ctx: &PluginContext) -> Result<(), String> {
        self.editors.clear();
        info!(plugin_id = %ctx.id(), "Clear tab plugin unloaded");
        Ok(())
    }
}
