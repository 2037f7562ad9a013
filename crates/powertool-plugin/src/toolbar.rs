//! Declarative editor toolbars.
//!
//! Rendering is not the host's business here; a toolbar is a list of entries
//! whose callbacks fire when the UI (or a test) clicks them.

use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{error, info, warn};

use powertool_core::error::AppError;
use powertool_core::types::id::{EditorId, PluginId};

/// Click callback.
pub type ToolbarCallback = Arc<dyn Fn() + Send + Sync>;

/// One toolbar button.
#[derive(Clone)]
pub struct ToolbarEntry {
    /// Entry id, unique within the toolbar.
    pub id: String,
    /// Icon name.
    pub icon: String,
    /// Button text.
    pub text: String,
    callback: ToolbarCallback,
}

impl ToolbarEntry {
    /// Creates an entry.
    pub fn new<F>(id: impl Into<String>, icon: impl Into<String>, text: impl Into<String>, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            icon: icon.into(),
            text: text.into(),
            callback: Arc::new(callback),
        }
    }
}

impl std::fmt::Debug for ToolbarEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolbarEntry")
            .field("id", &self.id)
            .field("icon", &self.icon)
            .field("text", &self.text)
            .finish()
    }
}

/// A toolbar attached to an editor by a plugin.
#[derive(Debug)]
pub struct Toolbar {
    /// Toolbar id chosen by the plugin.
    pub id: String,
    /// Editor it belongs to.
    pub editor_id: EditorId,
    /// Plugin that created it.
    pub plugin_id: PluginId,
    /// When it was created.
    pub created_at: DateTime<Utc>,
    entries: Vec<ToolbarEntry>,
}

impl Toolbar {
    /// Entries in display order.
    pub fn entries(&self) -> &[ToolbarEntry] {
        &self.entries
    }

    /// Fires the callback of entry `entry_id`.
    ///
    /// Returns `false` if there is no such entry or the callback panicked.
    pub fn click(&self, entry_id: &str) -> bool {
        let Some(entry) = self.entries.iter().find(|e| e.id == entry_id) else {
            warn!(toolbar_id = %self.id, entry_id = %entry_id, "No such toolbar entry");
            return false;
        };

        let callback = entry.callback.clone();
        if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
            error!(
                toolbar_id = %self.id,
                plugin_id = %self.plugin_id,
                entry_id = %entry_id,
                "Toolbar callback panicked"
            );
            return false;
        }
        true
    }
}

/// All toolbars, keyed by (editor, plugin).
#[derive(Debug, Default)]
pub struct ToolbarRegistry {
    toolbars: DashMap<(EditorId, PluginId), Arc<Toolbar>>,
}

impl ToolbarRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a toolbar. A plugin gets at most one per editor.
    pub fn create(
        &self,
        editor_id: EditorId,
        plugin_id: PluginId,
        toolbar_id: impl Into<String>,
        entries: Vec<ToolbarEntry>,
    ) -> Result<Arc<Toolbar>, AppError> {
        let toolbar_id = toolbar_id.into();
        if toolbar_id.trim().is_empty() {
            return Err(AppError::validation("Toolbar id must not be empty"));
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate toolbar entry id '{}'",
                    entry.id
                )));
            }
        }

        match self.toolbars.entry((editor_id, plugin_id.clone())) {
            Entry::Occupied(existing) => Err(AppError::conflict(format!(
                "Plugin '{}' already created toolbar '{}' on editor {}",
                plugin_id,
                existing.get().id,
                editor_id
            ))),
            Entry::Vacant(slot) => {
                let toolbar = Arc::new(Toolbar {
                    id: toolbar_id,
                    editor_id,
                    plugin_id: plugin_id.clone(),
                    created_at: Utc::now(),
                    entries,
                });
                slot.insert(toolbar.clone());
                info!(
                    editor_id = %editor_id,
                    plugin_id = %plugin_id,
                    toolbar_id = %toolbar.id,
                    entries = toolbar.entries.len(),
                    "Toolbar created"
                );
                Ok(toolbar)
            }
        }
    }

    /// The toolbar a plugin created on an editor.
    pub fn get(&self, editor_id: EditorId, plugin_id: &PluginId) -> Option<Arc<Toolbar>> {
        self.toolbars
            .get(&(editor_id, plugin_id.clone()))
            .map(|t| t.value().clone())
    }

    /// All toolbars on an editor.
    pub fn for_editor(&self, editor_id: EditorId) -> Vec<Arc<Toolbar>> {
        let mut toolbars: Vec<Arc<Toolbar>> = self
            .toolbars
            .iter()
            .filter(|t| t.key().0 == editor_id)
            .map(|t| t.value().clone())
            .collect();
        toolbars.sort_by_key(|t| t.created_at);
        toolbars
    }

    /// Removes every toolbar a plugin created.
    pub fn remove_plugin(&self, plugin_id: &PluginId) -> usize {
        let before = self.toolbars.len();
        self.toolbars.retain(|(_, owner), _| owner != plugin_id);
        before - self.toolbars.len()
    }

    /// Removes every toolbar on an editor.
    pub fn remove_editor(&self, editor_id: EditorId) -> usize {
        let before = self.toolbars.len();
        self.toolbars.retain(|(editor, _), _| *editor != editor_id);
        before - self.toolbars.len()
    }

    /// Total number of toolbars.
    pub fn len(&self) -> usize {
        self.toolbars.len()
    }

    /// Whether there are no toolbars.
    pub fn is_empty(&self) -> bool {
        self.toolbars.is_empty()
    }
}
