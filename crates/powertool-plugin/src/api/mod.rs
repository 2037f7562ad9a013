//! Plugin API: context and namespaces exposed to plugin code.

pub mod context;
pub mod lua;
pub mod node;
pub mod services;

pub use context::PluginContext;
pub use lua::LuaApi;
pub use node::NodeApi;
pub use services::{HostServices, ReleaseSummary};
