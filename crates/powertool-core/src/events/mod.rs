//! Host events observed by plugins.
//!
//! Node lifecycle transitions are produced by the connection subsystem and
//! fanned out through the node directory to callback observers and event
//! streams alike.

pub mod node;

pub use node::{NodeEvent, NodeState};
