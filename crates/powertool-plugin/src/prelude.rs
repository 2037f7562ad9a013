//! Prelude for convenient imports.

pub use async_trait::async_trait;

pub use powertool_core::types::id::{NodeId, PluginId, Token};
pub use powertool_realtime::{Payload, Receipt, ReplyHandle, Subscription};

pub use crate::api::context::PluginContext;
pub use crate::api::lua::LuaApi;
pub use crate::api::node::NodeApi;
pub use crate::editor::{EditorHandle, Tab};
pub use crate::hooks::definitions::{HookCallback, HookPoint, HookResult};
pub use crate::hooks::set::HookSet;
pub use crate::menu::ContextBuilder;
pub use crate::notify::NotificationLevel;
pub use crate::registry::{Plugin, PluginInfo};
pub use crate::toolbar::ToolbarEntry;
