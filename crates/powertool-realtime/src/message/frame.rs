//! Node wire frames.
//!
//! The in-process bus moves [`Envelope`]s directly. A concrete transport
//! (socket, pipe, IPC) speaks these JSON frames instead: nodes send
//! [`NodeFrame`]s to the host, and the host writes [`HostFrame`]s to nodes.
//!
//! ```json
//! {"type":"ipc","reply":"tok-1","payload":{"localPlayer":"bob"}}
//! {"type":"reply","token":"tok-1","plugin":"clear-tab","payload":"world"}
//! ```

use serde::{Deserialize, Serialize};

use powertool_core::types::id::{NodeId, PluginId, Token};

use super::envelope::{Envelope, EnvelopeKind};
use super::types::{Payload, Receipt};

/// Frames a node sends to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeFrame {
    /// A packet from node-side script code.
    Ipc {
        /// Token the host may reply with; absent means no reply is wanted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reply: Option<Token>,
        /// Packet body.
        #[serde(default)]
        payload: Payload,
    },
    /// An answer to a host request.
    Reply {
        /// Token of the host request being answered.
        token: Token,
        /// Plugin that sent the request, echoed from the `packet` frame.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plugin: Option<PluginId>,
        /// Reply body.
        #[serde(default)]
        payload: Payload,
    },
}

impl NodeFrame {
    /// Converts the frame into an envelope from `source` to `host`.
    pub fn into_envelope(self, source: NodeId, host: NodeId) -> Envelope {
        match self {
            Self::Ipc { reply, payload } => Envelope::request(source, host, reply, payload),
            Self::Reply {
                token,
                plugin,
                payload,
            } => Envelope::reply(source, host, token, payload).with_plugin(plugin),
        }
    }
}

/// Frames the host writes to a node.
///
/// Mirrors the arguments a node-side reply hook receives: who sent it, the
/// incoming/reply token, and the data. `from` is always the sending endpoint;
/// `plugin` names the host plugin behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostFrame {
    /// A request from the host; answer with a `reply` frame carrying `token`.
    Packet {
        /// Sending endpoint.
        from: NodeId,
        /// Reply token, if a reply is wanted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<Token>,
        /// Plugin that sent the packet. Echo it on the `reply` frame.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plugin: Option<PluginId>,
        /// Packet body.
        payload: Payload,
    },
    /// An answer to a packet the node sent earlier.
    Reply {
        /// Sending endpoint.
        from: NodeId,
        /// Token of the node's packet being answered.
        token: Token,
        /// Plugin that answered.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plugin: Option<PluginId>,
        /// Reply body.
        payload: Payload,
    },
}

impl HostFrame {
    /// Builds the frame a transport should write for `envelope`.
    pub fn from_envelope(envelope: &Envelope) -> Self {
        match (envelope.kind, envelope.token.clone()) {
            (EnvelopeKind::Reply, Some(token)) => Self::Reply {
                from: envelope.source.clone(),
                token,
                plugin: envelope.plugin.clone(),
                payload: envelope.payload.clone(),
            },
            (_, token) => Self::Packet {
                from: envelope.source.clone(),
                token,
                plugin: envelope.plugin.clone(),
                payload: envelope.payload.clone(),
            },
        }
    }

    /// Builds the frame for a receipt delivered to a bridged node endpoint.
    pub fn from_receipt(from: NodeId, receipt: &Receipt) -> Self {
        match &receipt.correlation {
            Some(token) => Self::Reply {
                from,
                token: token.clone(),
                plugin: receipt.plugin.clone(),
                payload: receipt.payload.clone(),
            },
            None => Self::Packet {
                from,
                token: receipt.reply_token.clone(),
                plugin: receipt.plugin.clone(),
                payload: receipt.payload.clone(),
            },
        }
    }
}
