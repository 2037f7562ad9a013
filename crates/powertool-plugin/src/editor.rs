//! Minimal in-memory editor and tab model.
//!
//! Just enough state for hooks to act on: an editor owns ordered tabs, each
//! with a title and text contents.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use powertool_core::error::AppError;
use powertool_core::types::id::{EditorId, TabId};

/// Snapshot of a tab, handed to tab hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    /// Tab id.
    pub id: TabId,
    /// Owning editor.
    pub editor_id: EditorId,
    /// Display title.
    pub title: String,
    /// Text contents at snapshot time.
    pub contents: String,
}

struct EditorInner {
    id: EditorId,
    created_at: DateTime<Utc>,
    tabs: RwLock<Vec<Tab>>,
    closed: AtomicBool,
}

/// Shared handle to one editor instance.
#[derive(Clone)]
pub struct EditorHandle {
    inner: Arc<EditorInner>,
}

impl EditorHandle {
    fn new() -> Self {
        Self {
            inner: Arc::new(EditorInner {
                id: EditorId::new(),
                created_at: Utc::now(),
                tabs: RwLock::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Editor id.
    pub fn id(&self) -> EditorId {
        self.inner.id
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// Whether the host has closed this editor. Handles held by plugins
    /// outlive the editor; this is how they tell.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Opens a new tab at the end of the tab strip.
    pub fn open_tab(&self, title: impl Into<String>, contents: impl Into<String>) -> Tab {
        let tab = Tab {
            id: TabId::new(),
            editor_id: self.inner.id,
            title: title.into(),
            contents: contents.into(),
        };
        self.inner.tabs.write().push(tab.clone());
        debug!(editor_id = %self.inner.id, tab_id = %tab.id, title = %tab.title, "Tab opened");
        tab
    }

    /// Closes a tab. Returns `false` if it did not exist.
    pub fn close_tab(&self, tab_id: TabId) -> bool {
        let mut tabs = self.inner.tabs.write();
        let before = tabs.len();
        tabs.retain(|t| t.id != tab_id);
        tabs.len() < before
    }

    /// Current snapshot of a tab.
    pub fn tab(&self, tab_id: TabId) -> Option<Tab> {
        self.inner.tabs.read().iter().find(|t| t.id == tab_id).cloned()
    }

    /// Snapshots of all tabs, in strip order.
    pub fn tabs(&self) -> Vec<Tab> {
        self.inner.tabs.read().clone()
    }

    /// Current contents of a tab.
    pub fn contents(&self, tab_id: TabId) -> Option<String> {
        self.tab(tab_id).map(|t| t.contents)
    }

    /// Replaces a tab's contents.
    pub fn set_contents(&self, tab_id: TabId, contents: impl Into<String>) -> Result<(), AppError> {
        let mut tabs = self.inner.tabs.write();
        let tab = tabs
            .iter_mut()
            .find(|t| t.id == tab_id)
            .ok_or_else(|| AppError::not_found(format!("Tab '{}' not found", tab_id)))?;
        tab.contents = contents.into();
        debug!(editor_id = %self.inner.id, tab_id = %tab_id, "Tab contents replaced");
        Ok(())
    }
}

impl PartialEq for EditorHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for EditorHandle {}

impl std::fmt::Debug for EditorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorHandle")
            .field("id", &self.inner.id)
            .field("tabs", &self.inner.tabs.read().len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// All live editors, in creation order.
#[derive(Debug, Default)]
pub struct EditorRegistry {
    editors: DashMap<EditorId, EditorHandle>,
    order: RwLock<Vec<EditorId>>,
}

impl EditorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an editor and makes it the current one.
    pub fn create(&self) -> EditorHandle {
        let editor = EditorHandle::new();
        self.editors.insert(editor.id(), editor.clone());
        self.order.write().push(editor.id());
        info!(editor_id = %editor.id(), "Editor created");
        editor
    }

    /// Looks up an editor.
    pub fn get(&self, id: EditorId) -> Option<EditorHandle> {
        self.editors.get(&id).map(|e| e.value().clone())
    }

    /// The most recently created editor that is still open.
    pub fn latest(&self) -> Option<EditorHandle> {
        let order = self.order.read();
        order.iter().rev().find_map(|id| self.get(*id))
    }

    /// Closes an editor and marks its handles closed.
    pub fn close(&self, id: EditorId) -> bool {
        let Some((_, editor)) = self.editors.remove(&id) else {
            return false;
        };
        self.order.write().retain(|e| *e != id);
        editor.inner.closed.store(true, Ordering::SeqCst);
        info!(editor_id = %id, "Editor closed");
        true
    }

    /// Number of open editors.
    pub fn len(&self) -> usize {
        self.editors.len()
    }

    /// Whether no editor is open.
    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }
}
