//! Hook sets: what a plugin hands to `register_hooks`.

use std::collections::BTreeMap;

use tracing::debug;

use powertool_core::types::id::PluginId;

use super::definitions::{HookCallback, HookPoint, HookResult, ResolvedHooks};
use crate::api::context::PluginContext;
use crate::editor::{EditorHandle, Tab};
use crate::menu::ContextBuilder;

/// `domain → event → callback`, keyed by the registration-surface names.
///
/// Unknown pairs are accepted here and only dropped at resolution, so a
/// plugin written for a newer host still registers the hooks this host knows.
#[derive(Debug, Clone, Default)]
pub struct HookSet {
    domains: BTreeMap<String, BTreeMap<String, HookCallback>>,
}

impl HookSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a callback for `(domain, event)`, replacing an earlier one for the
    /// same pair.
    pub fn on(mut self, domain: impl Into<String>, event: impl Into<String>, callback: HookCallback) -> Self {
        self.insert(domain, event, callback);
        self
    }

    /// In-place form of [`HookSet::on`].
    pub fn insert(&mut self, domain: impl Into<String>, event: impl Into<String>, callback: HookCallback) {
        self.domains
            .entry(domain.into())
            .or_default()
            .insert(event.into(), callback);
    }

    /// Shorthand for `on("tab", "onContext", ..)`.
    pub fn on_tab_context<F>(self, f: F) -> Self
    where
        F: Fn(&PluginContext, &Tab, &mut ContextBuilder<'_>) -> HookResult + Send + Sync + 'static,
    {
        let point = HookPoint::TabContext;
        self.on(point.domain(), point.event(), HookCallback::tab_context(f))
    }

    /// Shorthand for `on("editor", "onCreate", ..)`.
    pub fn on_editor_create<F>(self, f: F) -> Self
    where
        F: Fn(&PluginContext, &EditorHandle) -> HookResult + Send + Sync + 'static,
    {
        let point = HookPoint::EditorCreate;
        self.on(point.domain(), point.event(), HookCallback::editor_create(f))
    }

    /// Shorthand for `on("editor", "onClose", ..)`.
    pub fn on_editor_close<F>(self, f: F) -> Self
    where
        F: Fn(&PluginContext, &EditorHandle) -> HookResult + Send + Sync + 'static,
    {
        let point = HookPoint::EditorClose;
        self.on(point.domain(), point.event(), HookCallback::editor_close(f))
    }

    /// Number of `(domain, event)` entries, recognised or not.
    pub fn len(&self) -> usize {
        self.domains.values().map(BTreeMap::len).sum()
    }

    /// Whether the set has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wires recognised pairs to typed hooks; everything else is ignored.
    pub fn resolve(self, plugin_id: &PluginId) -> ResolvedHooks {
        let mut resolved = ResolvedHooks::default();

        for (domain, events) in self.domains {
            for (event, callback) in events {
                let Some(point) = HookPoint::from_pair(&domain, &event) else {
                    debug!(
                        plugin_id = %plugin_id,
                        domain = %domain,
                        event = %event,
                        "Ignoring unknown hook"
                    );
                    continue;
                };

                match (point, callback) {
                    (HookPoint::TabContext, HookCallback::TabContext(f)) => {
                        resolved.tab_context = Some(f);
                    }
                    (HookPoint::EditorCreate, HookCallback::EditorCreate(f)) => {
                        resolved.editor_create = Some(f);
                    }
                    (HookPoint::EditorClose, HookCallback::EditorClose(f)) => {
                        resolved.editor_close = Some(f);
                    }
                    (point, callback) => {
                        debug!(
                            plugin_id = %plugin_id,
                            hook = %point,
                            callback = ?callback.point(),
                            "Ignoring hook with mismatched callback kind"
                        );
                    }
                }
            }
        }

        resolved
    }
}
