//! Host identity configuration.

use serde::{Deserialize, Serialize};

use crate::types::id::HOST_NODE_ID;

/// Host identity and startup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Display name of this host instance.
    #[serde(default = "default_name")]
    pub name: String,
    /// Endpoint id the host uses on the message bus.
    #[serde(default = "default_node_id")]
    pub node_id: String,
    /// Nodes to mount at startup (useful for demos and local testing).
    #[serde(default)]
    pub nodes: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            node_id: default_node_id(),
            nodes: Vec::new(),
        }
    }
}

fn default_name() -> String {
    "powertool-host".to_string()
}

fn default_node_id() -> String {
    HOST_NODE_ID.to_string()
}
