//! Node lifecycle events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::NodeId;

/// Connection state of a node tracked by the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// The node is mounted and reachable.
    Connected,
    /// The node has been unmounted.
    Disconnected,
}

/// A connect or disconnect transition of a remote node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeEvent {
    /// A node connected and is now listed by the directory.
    Mounted {
        /// The node that connected.
        node_id: NodeId,
        /// When the transition happened.
        at: DateTime<Utc>,
    },
    /// A node disconnected and is no longer listed.
    Unmounted {
        /// The node that disconnected.
        node_id: NodeId,
        /// When the transition happened.
        at: DateTime<Utc>,
    },
}

impl NodeEvent {
    /// Creates a mount event stamped with the current time.
    pub fn mounted(node_id: NodeId) -> Self {
        Self::Mounted {
            node_id,
            at: Utc::now(),
        }
    }

    /// Creates an unmount event stamped with the current time.
    pub fn unmounted(node_id: NodeId) -> Self {
        Self::Unmounted {
            node_id,
            at: Utc::now(),
        }
    }

    /// The node this event is about.
    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::Mounted { node_id, .. } | Self::Unmounted { node_id, .. } => node_id,
        }
    }

    /// The state the node is in after this transition.
    pub fn state(&self) -> NodeState {
        match self {
            Self::Mounted { .. } => NodeState::Connected,
            Self::Unmounted { .. } => NodeState::Disconnected,
        }
    }
}
