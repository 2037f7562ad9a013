//! Directory record for a single mounted node.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use powertool_core::events::NodeState;
use powertool_core::types::id::NodeId;

/// Snapshot of a node as tracked by the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Node id.
    pub node_id: NodeId,
    /// Connection state.
    pub state: NodeState,
    /// Mount order; strictly increasing across the directory's lifetime.
    pub seq: u64,
    /// When the node was mounted.
    pub mounted_at: DateTime<Utc>,
}

impl NodeInfo {
    pub(crate) fn connected(node_id: NodeId, seq: u64) -> Self {
        Self {
            node_id,
            state: NodeState::Connected,
            seq,
            mounted_at: Utc::now(),
        }
    }
}
