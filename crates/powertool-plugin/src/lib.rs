//! # powertool-plugin
//!
//! Plugin framework for the Powertool host. Provides:
//!
//! - Hook sets, a hook registry and a synchronous, panic-isolating dispatcher
//! - Tab context menus, a minimal editor/tab model and declarative toolbars
//! - The plugin context (`name`, `register_hooks`, `node`, `lua`,
//!   `create_toolbar`, `editor`, `notify`)
//! - Plugin lifecycle management and the `PowertoolHost` facade

pub mod api;
pub mod editor;
pub mod hooks;
pub mod host;
pub mod manager;
pub mod menu;
pub mod notify;
pub mod prelude;
pub mod registry;
pub mod toolbar;

pub use api::context::PluginContext;
pub use hooks::definitions::{HookCallback, HookPoint, HookResult};
pub use hooks::dispatcher::HookDispatcher;
pub use hooks::registry::HookRegistry;
pub use hooks::set::HookSet;
pub use host::PowertoolHost;
pub use manager::PluginManager;
pub use registry::{Plugin, PluginInfo, PluginRegistry};
