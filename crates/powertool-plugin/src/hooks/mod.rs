//! Hook system: definitions, hook sets, registry, and dispatcher.

pub mod definitions;
pub mod dispatcher;
pub mod registry;
pub mod set;

pub use definitions::{HookCallback, HookPoint, HookResult};
pub use dispatcher::{DispatchReport, HookDispatcher};
pub use registry::HookRegistry;
pub use set::HookSet;
