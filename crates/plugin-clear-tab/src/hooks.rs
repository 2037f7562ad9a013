//! Tab and editor hooks.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use powertool_core::types::id::EditorId;
use powertool_plugin::prelude::*;

/// Label of the context-menu action.
pub const CLEAR_TAB_LABEL: &str = "Clear tab";

/// Id of the toolbar created on each editor.
pub const TOOLBAR_ID: &str = "my-toolbar";

/// Editors captured from `editor.onCreate`, evicted on `editor.onClose`.
pub type EditorCache = Arc<DashMap<EditorId, EditorHandle>>;

/// Builds the plugin's hook set.
pub fn hook_set(editors: EditorCache) -> HookSet {
    let menu_editors = editors.clone();
    let closing_editors = editors.clone();

    HookSet::new()
        .on_tab_context(move |_ctx, tab, menu| {
            let editors = menu_editors.clone();
            let editor_id = tab.editor_id;
            let tab_id = tab.id;

            menu.add(CLEAR_TAB_LABEL, move || {
                let editor = editors
                    .get(&editor_id)
                    .map(|e| e.value().clone())
                    .ok_or_else(|| format!("Editor {editor_id} was not seen by this plugin"))?;
                editor.set_contents(tab_id, "").map_err(|e| e.to_string())
            });
            Ok(())
        })
        .on_editor_create(move |ctx, editor| {
            editors.insert(editor.id(), editor.clone());
            debug!(plugin_id = %ctx.id(), editor_id = %editor.id(), "Editor captured");

            if let Err(e) = ctx.create_toolbar(editor, TOOLBAR_ID, toolbar_entries(ctx)) {
                warn!(plugin_id = %ctx.id(), error = %e, "Toolbar not created");
                return Err(e.to_string());
            }
            Ok(())
        })
        .on_editor_close(move |ctx, editor| {
            if closing_editors.remove(&editor.id()).is_some() {
                debug!(plugin_id = %ctx.id(), editor_id = %editor.id(), "Editor released");
            }
            Ok(())
        })
}

fn toolbar_entries(ctx: &PluginContext) -> Vec<ToolbarEntry> {
    let happy = ctx.clone();
    let sad = ctx.clone();

    vec![
        ToolbarEntry::new("smile", "fluent:emoji-16-filled", "Smile!", move || {
            happy.notify(NotificationLevel::Success, "I am happy!", "Woohoo!");
        }),
        ToolbarEntry::new("sad", "fluent:emoji-sad-16-filled", "Sad!", move || {
            sad.notify(NotificationLevel::Error, "I am sad!", "Boohoo!");
        }),
    ]
}
