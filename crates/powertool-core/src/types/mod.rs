//! Shared identifier types.

pub mod id;

pub use id::{EditorId, HOST_NODE_ID, NodeId, PluginId, SubscriptionId, TabId, Token};
