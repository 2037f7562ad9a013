//! Hook point definitions and typed hook callbacks.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::context::PluginContext;
use crate::editor::{EditorHandle, Tab};
use crate::menu::ContextBuilder;

/// Enumeration of all hook points in the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    // ── Tab ──
    /// Fired while a tab context menu is being built.
    TabContext,

    // ── Editor ──
    /// Fired once when an editor is created, before it is handed out.
    EditorCreate,
    /// Fired once when the host closes an editor, before its toolbars go.
    EditorClose,
}

impl HookPoint {
    /// Every hook point, in declaration order.
    pub const ALL: [HookPoint; 3] = [
        HookPoint::TabContext,
        HookPoint::EditorCreate,
        HookPoint::EditorClose,
    ];

    /// Resolves a registration-surface `(domain, event)` pair.
    pub fn from_pair(domain: &str, event: &str) -> Option<Self> {
        match (domain, event) {
            ("tab", "onContext") => Some(Self::TabContext),
            ("editor", "onCreate") => Some(Self::EditorCreate),
            ("editor", "onClose") => Some(Self::EditorClose),
            _ => None,
        }
    }

    /// Domain name at the registration surface.
    pub fn domain(&self) -> &'static str {
        match self {
            Self::TabContext => "tab",
            Self::EditorCreate | Self::EditorClose => "editor",
        }
    }

    /// Event name at the registration surface.
    pub fn event(&self) -> &'static str {
        match self {
            Self::TabContext => "onContext",
            Self::EditorCreate => "onCreate",
            Self::EditorClose => "onClose",
        }
    }

    /// Returns the string name of this hook point.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TabContext => "tab.onContext",
            Self::EditorCreate => "editor.onCreate",
            Self::EditorClose => "editor.onClose",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a hook returns. An `Err` is logged at the dispatch boundary.
pub type HookResult = Result<(), String>;

/// `tab.onContext` callback.
pub type TabContextHook =
    Arc<dyn Fn(&PluginContext, &Tab, &mut ContextBuilder<'_>) -> HookResult + Send + Sync>;

/// Callback receiving one editor.
pub type EditorHook = Arc<dyn Fn(&PluginContext, &EditorHandle) -> HookResult + Send + Sync>;

/// `editor.onCreate` callback.
pub type EditorCreateHook = EditorHook;

/// `editor.onClose` callback.
pub type EditorCloseHook = EditorHook;

/// A callback as registered, before it is matched to a hook point.
#[derive(Clone)]
pub enum HookCallback {
    /// Receives the tab and the menu builder.
    TabContext(TabContextHook),
    /// Receives the new editor.
    EditorCreate(EditorCreateHook),
    /// Receives the editor being closed.
    EditorClose(EditorCloseHook),
}

impl HookCallback {
    /// Wraps a tab context-menu callback.
    pub fn tab_context<F>(f: F) -> Self
    where
        F: Fn(&PluginContext, &Tab, &mut ContextBuilder<'_>) -> HookResult + Send + Sync + 'static,
    {
        Self::TabContext(Arc::new(f))
    }

    /// Wraps an editor creation callback.
    pub fn editor_create<F>(f: F) -> Self
    where
        F: Fn(&PluginContext, &EditorHandle) -> HookResult + Send + Sync + 'static,
    {
        Self::EditorCreate(Arc::new(f))
    }

    /// Wraps an editor close callback.
    pub fn editor_close<F>(f: F) -> Self
    where
        F: Fn(&PluginContext, &EditorHandle) -> HookResult + Send + Sync + 'static,
    {
        Self::EditorClose(Arc::new(f))
    }

    /// The hook point this callback's signature fits.
    pub fn point(&self) -> HookPoint {
        match self {
            Self::TabContext(_) => HookPoint::TabContext,
            Self::EditorCreate(_) => HookPoint::EditorCreate,
            Self::EditorClose(_) => HookPoint::EditorClose,
        }
    }
}

impl fmt::Debug for HookCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HookCallback::{:?}(<closure>)", self.point())
    }
}

/// Hooks of one plugin after resolution: at most one callback per point.
#[derive(Clone, Default)]
pub struct ResolvedHooks {
    /// `tab.onContext`.
    pub tab_context: Option<TabContextHook>,
    /// `editor.onCreate`.
    pub editor_create: Option<EditorCreateHook>,
    /// `editor.onClose`.
    pub editor_close: Option<EditorCloseHook>,
}

impl ResolvedHooks {
    /// Hook points with a callback wired up.
    pub fn points(&self) -> Vec<HookPoint> {
        let mut points = Vec::new();
        if self.tab_context.is_some() {
            points.push(HookPoint::TabContext);
        }
        if self.editor_create.is_some() {
            points.push(HookPoint::EditorCreate);
        }
        if self.editor_close.is_some() {
            points.push(HookPoint::EditorClose);
        }
        points
    }

    /// Whether a callback is wired for `point`.
    pub fn has(&self, point: HookPoint) -> bool {
        match point {
            HookPoint::TabContext => self.tab_context.is_some(),
            HookPoint::EditorCreate => self.editor_create.is_some(),
            HookPoint::EditorClose => self.editor_close.is_some(),
        }
    }

    /// Whether nothing is wired.
    pub fn is_empty(&self) -> bool {
        self.tab_context.is_none() && self.editor_create.is_none() && self.editor_close.is_none()
    }
}

impl fmt::Debug for ResolvedHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedHooks")
            .field("points", &self.points())
            .finish()
    }
}
