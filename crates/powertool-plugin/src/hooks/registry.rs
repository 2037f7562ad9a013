//! Hook registry: one resolved hook set per plugin, in registration order.

use parking_lot::RwLock;
use tracing::info;

use powertool_core::types::id::PluginId;

use super::definitions::{HookPoint, ResolvedHooks};
use crate::api::context::PluginContext;

/// Entry in the hook registry.
#[derive(Debug, Clone)]
pub(crate) struct HookEntry {
    /// Plugin that registered the set.
    pub plugin_id: PluginId,
    /// Context handed back to the plugin's hooks.
    pub context: PluginContext,
    /// The resolved set.
    pub hooks: ResolvedHooks,
}

/// Registry of plugin hook sets.
///
/// Dispatch works on a snapshot, so a hook may call `register_hooks` while
/// it is being dispatched; the new set applies from the next dispatch on.
#[derive(Debug, Default)]
pub struct HookRegistry {
    entries: RwLock<Vec<HookEntry>>,
}

impl HookRegistry {
    /// Creates a new empty hook registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a plugin's whole hook set.
    ///
    /// A plugin registering for the first time goes to the end of the
    /// dispatch order; a re-registration keeps its place.
    pub fn register(&self, context: &PluginContext, hooks: ResolvedHooks) {
        let plugin_id = context.id().clone();
        let points = hooks.points();

        let mut entries = self.entries.write();
        let replaced = match entries.iter_mut().find(|e| e.plugin_id == plugin_id) {
            Some(entry) => {
                entry.hooks = hooks;
                entry.context = context.clone();
                true
            }
            None => {
                entries.push(HookEntry {
                    plugin_id: plugin_id.clone(),
                    context: context.clone(),
                    hooks,
                });
                false
            }
        };
        drop(entries);

        info!(
            plugin_id = %plugin_id,
            hooks = ?points,
            replaced = replaced,
            "Hook set registered"
        );
    }

    /// Drops a plugin's hook set. Returns whether it had one.
    pub fn unregister_plugin(&self, plugin_id: &PluginId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| &e.plugin_id != plugin_id);
        let removed = entries.len() < before;
        drop(entries);

        if removed {
            info!(plugin_id = %plugin_id, "Hook set unregistered");
        }
        removed
    }

    /// Snapshot of entries with a callback for `point`, in dispatch order.
    pub(crate) fn handlers(&self, point: HookPoint) -> Vec<HookEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.hooks.has(point))
            .cloned()
            .collect()
    }

    /// Hook points wired for a plugin.
    pub fn registered_hooks(&self, plugin_id: &PluginId) -> Vec<HookPoint> {
        self.entries
            .read()
            .iter()
            .find(|e| &e.plugin_id == plugin_id)
            .map(|e| e.hooks.points())
            .unwrap_or_default()
    }

    /// Whether any plugin handles `point`.
    pub fn has_handlers(&self, point: HookPoint) -> bool {
        self.entries.read().iter().any(|e| e.hooks.has(point))
    }

    /// Number of plugins handling `point`.
    pub fn handler_count(&self, point: HookPoint) -> usize {
        self.entries
            .read()
            .iter()
            .filter(|e| e.hooks.has(point))
            .count()
    }

    /// Plugins with a registered set, in dispatch order.
    pub fn plugins(&self) -> Vec<PluginId> {
        self.entries
            .read()
            .iter()
            .map(|e| e.plugin_id.clone())
            .collect()
    }
}
