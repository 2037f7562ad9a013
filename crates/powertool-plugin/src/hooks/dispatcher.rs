//! Hook dispatcher: fires hooks synchronously, in plugin registration order.
//!
//! Every hook runs behind a guard: an `Err` return or a panic is logged with
//! the plugin id and hook point, and dispatch moves on to the next plugin.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error};

use powertool_core::types::id::PluginId;

use super::definitions::{EditorHook, HookPoint, HookResult, ResolvedHooks};
use super::registry::HookRegistry;
use crate::editor::{EditorHandle, Tab};
use crate::menu::ContextMenu;

/// A hook that returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookFailure {
    /// Plugin whose hook failed.
    pub plugin_id: PluginId,
    /// Error text, or a panic marker.
    pub message: String,
}

/// Outcome of dispatching one hook point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Hook point fired.
    pub point: HookPoint,
    /// Hooks invoked.
    pub invoked: usize,
    /// Hooks that failed.
    pub failures: Vec<HookFailure>,
}

impl DispatchReport {
    fn new(point: HookPoint) -> Self {
        Self {
            point,
            invoked: 0,
            failures: Vec::new(),
        }
    }

    /// Whether every hook succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Dispatches hooks to all registered plugins.
#[derive(Debug)]
pub struct HookDispatcher {
    /// Hook registry.
    registry: Arc<HookRegistry>,
}

impl HookDispatcher {
    /// Creates a new hook dispatcher.
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self { registry }
    }

    /// Builds a context menu for `tab` from every plugin's `tab.onContext`.
    pub fn tab_context(&self, tab: &Tab) -> ContextMenu {
        self.tab_context_with_report(tab).0
    }

    /// Like [`HookDispatcher::tab_context`], also returning the dispatch report.
    ///
    /// Entries added by a hook that then fails are discarded.
    pub fn tab_context_with_report(&self, tab: &Tab) -> (ContextMenu, DispatchReport) {
        let point = HookPoint::TabContext;
        let handlers = self.registry.handlers(point);
        let mut menu = ContextMenu::new(tab.id);
        let mut report = DispatchReport::new(point);

        debug!(hook = %point, tab_id = %tab.id, handler_count = handlers.len(), "Dispatching hook");

        for entry in handlers {
            let Some(hook) = entry.hooks.tab_context.as_ref() else {
                continue;
            };

            let mark = menu.len();
            let outcome = {
                let mut builder = menu.builder(entry.plugin_id.clone());
                guarded(point, &entry.plugin_id, || hook(&entry.context, tab, &mut builder))
            };

            report.invoked += 1;
            if let Err(message) = outcome {
                menu.truncate(mark);
                report.failures.push(HookFailure {
                    plugin_id: entry.plugin_id,
                    message,
                });
            }
        }

        (menu, report)
    }

    /// Fires `editor.onCreate` once per plugin.
    ///
    /// Callers register the editor as current before dispatching, so hooks
    /// see it through `PluginContext::editor` as well.
    pub fn editor_created(&self, editor: &EditorHandle) -> DispatchReport {
        self.fire_editor(HookPoint::EditorCreate, editor, |hooks| {
            hooks.editor_create.as_ref()
        })
    }

    /// Fires `editor.onClose` once per plugin, while the editor is still
    /// registered.
    pub fn editor_closed(&self, editor: &EditorHandle) -> DispatchReport {
        self.fire_editor(HookPoint::EditorClose, editor, |hooks| {
            hooks.editor_close.as_ref()
        })
    }

    fn fire_editor<S>(&self, point: HookPoint, editor: &EditorHandle, select: S) -> DispatchReport
    where
        S: Fn(&ResolvedHooks) -> Option<&EditorHook>,
    {
        let handlers = self.registry.handlers(point);
        let mut report = DispatchReport::new(point);

        debug!(hook = %point, editor_id = %editor.id(), handler_count = handlers.len(), "Dispatching hook");

        for entry in handlers {
            let Some(hook) = select(&entry.hooks) else {
                continue;
            };

            report.invoked += 1;
            if let Err(message) = guarded(point, &entry.plugin_id, || hook(&entry.context, editor)) {
                report.failures.push(HookFailure {
                    plugin_id: entry.plugin_id.clone(),
                    message,
                });
            }
        }

        report
    }

    /// Returns a reference to the hook registry.
    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }
}

/// Runs one hook, converting errors and panics into a logged `Err`.
fn guarded<F>(point: HookPoint, plugin_id: &PluginId, hook: F) -> Result<(), String>
where
    F: FnOnce() -> HookResult,
{
    match catch_unwind(AssertUnwindSafe(hook)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!(hook = %point, plugin_id = %plugin_id, error = %e, "Hook returned an error");
            Err(e)
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "hook panicked".to_string());
            error!(hook = %point, plugin_id = %plugin_id, panic = %message, "Hook panicked");
            Err(format!("panic: {message}"))
        }
    }
}
