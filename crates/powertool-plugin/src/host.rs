//! Host facade wiring the engine, registries and plugin manager together.

use std::sync::Arc;

use tracing::info;

use powertool_core::config::AppConfig;
use powertool_core::error::AppError;
use powertool_core::types::id::{EditorId, NodeId, PluginId, TabId};
use powertool_realtime::{MetricsSnapshot, NodeRuntime, RealtimeEngine};

use crate::api::context::PluginContext;
use crate::api::services::{HostServices, ReleaseSummary};
use crate::editor::{EditorHandle, EditorRegistry};
use crate::hooks::dispatcher::{DispatchReport, HookDispatcher};
use crate::manager::PluginManager;
use crate::menu::ContextMenu;
use crate::notify::{Notifier, TracingNotifier};
use crate::registry::{Plugin, PluginInfo};
use crate::toolbar::ToolbarRegistry;

/// A running extension host.
///
/// Must be created from within a tokio runtime.
#[derive(Debug)]
pub struct PowertoolHost {
    config: AppConfig,
    engine: RealtimeEngine,
    services: HostServices,
    dispatcher: HookDispatcher,
    plugins: PluginManager,
}

impl PowertoolHost {
    /// Boots a host that logs plugin notifications.
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        Self::with_notifier(config, Arc::new(TracingNotifier))
    }

    /// Boots a host with a custom notification sink.
    pub fn with_notifier(config: AppConfig, notifier: Arc<dyn Notifier>) -> Result<Self, AppError> {
        let engine = RealtimeEngine::new(&config)?;
        let services = HostServices::new(engine.clone(), notifier);
        let dispatcher = HookDispatcher::new(services.hooks.clone());
        let plugins = PluginManager::new(services.clone(), config.plugins.clone());

        info!(name = %config.host.name, host_id = %engine.host_id(), "Powertool host started");

        Ok(Self {
            config,
            engine,
            services,
            dispatcher,
            plugins,
        })
    }

    /// Loads a plugin.
    pub async fn load_plugin(&self, plugin: Arc<dyn Plugin>) -> Result<PluginContext, AppError> {
        self.plugins.load_plugin(plugin).await
    }

    /// Unloads a plugin.
    pub async fn unload_plugin(&self, plugin_id: &PluginId) -> Result<ReleaseSummary, AppError> {
        self.plugins.unload_plugin(plugin_id).await
    }

    /// Loaded plugins in load order.
    pub async fn plugins(&self) -> Vec<PluginInfo> {
        self.plugins.list_plugins().await
    }

    /// Creates an editor and fires `editor.onCreate` before returning it.
    pub fn create_editor(&self) -> EditorHandle {
        self.create_editor_with_report().0
    }

    /// Like [`PowertoolHost::create_editor`], also returning the dispatch report.
    pub fn create_editor_with_report(&self) -> (EditorHandle, DispatchReport) {
        let editor = self.services.editors.create();
        let report = self.dispatcher.editor_created(&editor);
        (editor, report)
    }

    /// Closes an editor: fires `editor.onClose`, then drops the editor and
    /// every toolbar on it. Returns `None` if no such editor is open.
    pub fn close_editor(&self, editor_id: EditorId) -> Option<DispatchReport> {
        let editor = self.services.editors.get(editor_id)?;
        let report = self.dispatcher.editor_closed(&editor);
        self.services.editors.close(editor_id);
        let toolbars = self.services.toolbars.remove_editor(editor_id);
        info!(editor_id = %editor_id, toolbars = toolbars, "Editor torn down");
        Some(report)
    }

    /// Builds the context menu for a tab.
    pub fn tab_context(&self, editor: &EditorHandle, tab_id: TabId) -> Result<ContextMenu, AppError> {
        let tab = editor
            .tab(tab_id)
            .ok_or_else(|| AppError::not_found(format!("Tab '{}' not found", tab_id)))?;
        Ok(self.dispatcher.tab_context(&tab))
    }

    /// Connects a node.
    pub fn connect_node(&self, node_id: impl Into<NodeId>) -> Result<NodeRuntime, AppError> {
        self.engine.connections.connect(node_id.into())
    }

    /// Connects a node, running `setup` before mount observers fire.
    pub fn connect_node_with<F>(&self, node_id: impl Into<NodeId>, setup: F) -> Result<NodeRuntime, AppError>
    where
        F: FnOnce(&NodeRuntime),
    {
        self.engine.connections.connect_with(node_id.into(), setup)
    }

    /// Disconnects a node.
    pub fn disconnect_node(&self, node_id: &NodeId) -> Result<(), AppError> {
        self.engine.connections.disconnect(node_id)
    }

    /// Routes a raw frame received from a node's transport.
    pub fn handle_inbound(&self, node_id: &NodeId, raw: &str) -> Result<(), AppError> {
        self.engine.connections.handle_inbound(node_id, raw)
    }

    /// Connected node ids in mount order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.engine.directory.list()
    }

    /// Messaging counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.engine.metrics.snapshot()
    }

    /// Effective configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Node directory and message bus.
    pub fn engine(&self) -> &RealtimeEngine {
        &self.engine
    }

    /// Editor model.
    pub fn editors(&self) -> &Arc<EditorRegistry> {
        &self.services.editors
    }

    /// Toolbars.
    pub fn toolbars(&self) -> &Arc<ToolbarRegistry> {
        &self.services.toolbars
    }

    /// Hook dispatcher.
    pub fn dispatcher(&self) -> &HookDispatcher {
        &self.dispatcher
    }

    /// Plugin manager.
    pub fn plugin_manager(&self) -> &PluginManager {
        &self.plugins
    }

    /// Unloads every plugin, then disconnects every node.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        info!("Shutting down Powertool host");
        self.plugins.unload_all().await?;
        self.engine.shutdown();
        info!("Powertool host shut down");
        Ok(())
    }
}
