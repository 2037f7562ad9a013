//! Host services shared by every plugin context.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use powertool_core::types::id::PluginId;
use powertool_realtime::RealtimeEngine;

use super::context::PluginContext;
use super::lua::LuaApi;
use super::node::NodeApi;
use crate::editor::EditorRegistry;
use crate::hooks::registry::HookRegistry;
use crate::notify::Notifier;
use crate::registry::PluginInfo;
use crate::toolbar::ToolbarRegistry;

/// What was removed when a plugin's registrations were released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseSummary {
    /// Whether a hook set was dropped.
    pub hooks: bool,
    /// Node observers removed.
    pub observers: usize,
    /// Message listeners removed.
    pub listeners: usize,
    /// Toolbars removed.
    pub toolbars: usize,
}

/// Services a plugin context is built from.
#[derive(Clone)]
pub struct HostServices {
    /// Node directory and message bus.
    pub engine: RealtimeEngine,
    /// Hook registry.
    pub hooks: Arc<HookRegistry>,
    /// Editor model.
    pub editors: Arc<EditorRegistry>,
    /// Toolbars.
    pub toolbars: Arc<ToolbarRegistry>,
    /// Notification sink.
    pub notifier: Arc<dyn Notifier>,
}

impl HostServices {
    /// Creates fresh registries around an engine.
    pub fn new(engine: RealtimeEngine, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            engine,
            hooks: Arc::new(HookRegistry::new()),
            editors: Arc::new(EditorRegistry::new()),
            toolbars: Arc::new(ToolbarRegistry::new()),
            notifier,
        }
    }

    /// Builds the context for a plugin. Registrations made through it are
    /// tagged with the plugin id.
    pub fn context_for(&self, info: PluginInfo) -> PluginContext {
        let view = self.engine.view(info.id.clone());
        let lua = LuaApi::new(
            info.id.clone(),
            self.engine.host_id().clone(),
            self.engine.bus.clone(),
            view.clone(),
        );

        PluginContext::new(
            info,
            Arc::downgrade(&self.hooks),
            NodeApi::new(view),
            lua,
            self.editors.clone(),
            self.toolbars.clone(),
            self.notifier.clone(),
        )
    }

    /// Removes everything a plugin registered.
    pub fn release(&self, plugin_id: &PluginId) -> ReleaseSummary {
        let summary = ReleaseSummary {
            hooks: self.hooks.unregister_plugin(plugin_id),
            observers: self.engine.directory.remove_observers(plugin_id),
            listeners: self.engine.bus.remove_listeners(plugin_id),
            toolbars: self.toolbars.remove_plugin(plugin_id),
        };
        debug!(plugin_id = %plugin_id, summary = ?summary, "Plugin registrations released");
        summary
    }
}

impl std::fmt::Debug for HostServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostServices")
            .field("engine", &self.engine)
            .field("hooks", &self.hooks)
            .finish()
    }
}
