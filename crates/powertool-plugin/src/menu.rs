//! Tab context menus.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{debug, error, warn};

use powertool_core::types::id::{PluginId, TabId};

use crate::hooks::definitions::HookResult;

/// Action run when a menu entry is activated.
pub type MenuAction = Arc<dyn Fn() -> HookResult + Send + Sync>;

/// One entry of a context menu.
#[derive(Clone)]
pub struct MenuEntry {
    /// Display label.
    pub label: String,
    /// Contributing plugin.
    pub plugin_id: PluginId,
    action: MenuAction,
}

impl std::fmt::Debug for MenuEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuEntry")
            .field("label", &self.label)
            .field("plugin_id", &self.plugin_id)
            .finish()
    }
}

/// A context menu built for one interaction with a tab.
#[derive(Debug, Clone)]
pub struct ContextMenu {
    tab_id: TabId,
    entries: Vec<MenuEntry>,
}

impl ContextMenu {
    /// Creates an empty menu for a tab.
    pub fn new(tab_id: TabId) -> Self {
        Self {
            tab_id,
            entries: Vec::new(),
        }
    }

    /// Tab the menu was built for.
    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    /// Entries in contribution order.
    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// Entry labels in contribution order.
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no plugin contributed anything.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A builder that appends entries tagged with `plugin_id`.
    pub(crate) fn builder(&mut self, plugin_id: PluginId) -> ContextBuilder<'_> {
        ContextBuilder {
            entries: &mut self.entries,
            plugin_id,
        }
    }

    /// Drops entries past `len`, used to discard a failed contributor's additions.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// Runs the action at `index`.
    ///
    /// Returns `true` only if the entry exists and its action succeeded.
    /// Errors and panics are logged, never propagated.
    pub fn activate(&self, index: usize) -> bool {
        let Some(entry) = self.entries.get(index) else {
            warn!(tab_id = %self.tab_id, index = index, "No menu entry at index");
            return false;
        };

        let action = entry.action.clone();
        match catch_unwind(AssertUnwindSafe(|| action())) {
            Ok(Ok(())) => {
                debug!(
                    tab_id = %self.tab_id,
                    plugin_id = %entry.plugin_id,
                    label = %entry.label,
                    "Menu action ran"
                );
                true
            }
            Ok(Err(e)) => {
                error!(
                    tab_id = %self.tab_id,
                    plugin_id = %entry.plugin_id,
                    label = %entry.label,
                    error = %e,
                    "Menu action failed"
                );
                false
            }
            Err(_) => {
                error!(
                    tab_id = %self.tab_id,
                    plugin_id = %entry.plugin_id,
                    label = %entry.label,
                    "Menu action panicked"
                );
                false
            }
        }
    }

    /// Runs the first entry with `label`.
    pub fn activate_label(&self, label: &str) -> bool {
        match self.entries.iter().position(|e| e.label == label) {
            Some(index) => self.activate(index),
            None => false,
        }
    }
}

/// Handed to `tab.onContext` hooks; appends to the menu under construction.
pub struct ContextBuilder<'a> {
    entries: &'a mut Vec<MenuEntry>,
    plugin_id: PluginId,
}

impl ContextBuilder<'_> {
    /// Appends an entry.
    pub fn add<F>(&mut self, label: impl Into<String>, action: F) -> &mut Self
    where
        F: Fn() -> HookResult + Send + Sync + 'static,
    {
        self.entries.push(MenuEntry {
            label: label.into(),
            plugin_id: self.plugin_id.clone(),
            action: Arc::new(action),
        });
        self
    }

    /// Number of entries in the menu so far, from every contributor.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the menu is still empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
