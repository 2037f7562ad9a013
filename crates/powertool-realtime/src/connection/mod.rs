//! Node connections: the single writer of the node set, plus the node-side
//! runtime used by in-process nodes.

pub mod manager;
pub mod runtime;

pub use manager::ConnectionManager;
pub use runtime::NodeRuntime;
