//! Plugin context: the surface a loaded plugin talks to.

use std::sync::{Arc, Weak};

use chrono::Utc;
use tracing::warn;

use powertool_core::error::AppError;
use powertool_core::types::id::PluginId;

use super::lua::LuaApi;
use super::node::NodeApi;
use crate::editor::{EditorHandle, EditorRegistry};
use crate::hooks::registry::HookRegistry;
use crate::hooks::set::HookSet;
use crate::notify::{Notification, NotificationLevel, Notifier};
use crate::registry::PluginInfo;
use crate::toolbar::{Toolbar, ToolbarEntry, ToolbarRegistry};

struct ContextInner {
    info: PluginInfo,
    hooks: Weak<HookRegistry>,
    node: NodeApi,
    lua: LuaApi,
    editors: Arc<EditorRegistry>,
    toolbars: Arc<ToolbarRegistry>,
    notifier: Arc<dyn Notifier>,
}

/// Context passed to a plugin at load time and to each of its hooks.
///
/// Cheap to clone; clones refer to the same plugin.
#[derive(Clone)]
pub struct PluginContext {
    inner: Arc<ContextInner>,
}

impl PluginContext {
    pub(crate) fn new(
        info: PluginInfo,
        hooks: Weak<HookRegistry>,
        node: NodeApi,
        lua: LuaApi,
        editors: Arc<EditorRegistry>,
        toolbars: Arc<ToolbarRegistry>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                info,
                hooks,
                node,
                lua,
                editors,
                toolbars,
                notifier,
            }),
        }
    }

    /// Plugin display name.
    pub fn name(&self) -> &str {
        &self.inner.info.name
    }

    /// Plugin id.
    pub fn id(&self) -> &PluginId {
        &self.inner.info.id
    }

    /// Full plugin metadata.
    pub fn info(&self) -> &PluginInfo {
        &self.inner.info
    }

    /// Replaces this plugin's hook set. Unknown `(domain, event)` pairs are
    /// ignored.
    pub fn register_hooks(&self, hooks: HookSet) {
        let resolved = hooks.resolve(self.id());
        match self.inner.hooks.upgrade() {
            Some(registry) => registry.register(self, resolved),
            None => warn!(plugin_id = %self.id(), "Hooks not registered: host is shutting down"),
        }
    }

    /// Connected-node namespace.
    pub fn node(&self) -> &NodeApi {
        &self.inner.node
    }

    /// Node messaging namespace.
    pub fn lua(&self) -> &LuaApi {
        &self.inner.lua
    }

    /// The most recently created editor, if one is open.
    pub fn editor(&self) -> Option<EditorHandle> {
        self.inner.editors.latest()
    }

    /// Attaches a toolbar to `editor`. A plugin may do this once per editor.
    pub fn create_toolbar(
        &self,
        editor: &EditorHandle,
        toolbar_id: impl Into<String>,
        entries: Vec<ToolbarEntry>,
    ) -> Result<Arc<Toolbar>, AppError> {
        self.inner
            .toolbars
            .create(editor.id(), self.id().clone(), toolbar_id, entries)
    }

    /// Raises a host notification.
    pub fn notify(&self, level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) {
        self.inner.notifier.notify(Notification {
            plugin_id: self.id().clone(),
            level,
            title: title.into(),
            message: message.into(),
            raised_at: Utc::now(),
        });
    }
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("plugin_id", &self.inner.info.id)
            .field("name", &self.inner.info.name)
            .finish()
    }
}
