//! Packets exchanged with node-side scripts.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use powertool_plugin::prelude::*;

/// Token sent with the greeting broadcast at load time.
pub const GREETING_TOKEN: &str = "incoming-token";

/// Payload of the greeting broadcast.
pub const GREETING_PAYLOAD: &str = "Sent data goes here!";

/// Packet a node script sends to identify its player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPacket {
    /// Name of the local player on the node.
    pub local_player: String,
}

/// Text sent back for a player packet.
pub fn greeting_for(player: &str) -> String {
    format!("HELLO, {}!", player.to_uppercase())
}

/// Handles one packet from a node.
///
/// Player packets are answered through `reply`; replies to the greeting are
/// only logged.
pub fn handle_packet(node_id: NodeId, receipt: Receipt, reply: ReplyHandle) -> Option<Payload> {
    if let Some(token) = &receipt.correlation {
        info!(node_id = %node_id, token = %token, payload = %receipt.payload, "Node replied");
        return None;
    }

    info!(
        node_id = %node_id,
        reply_token = ?receipt.reply_token.as_ref().map(Token::as_str),
        "Packet from node"
    );

    match receipt.decode::<PlayerPacket>() {
        Ok(packet) => {
            reply.reply(greeting_for(&packet.local_player));
        }
        Err(e) => warn!(node_id = %node_id, error = %e, "Unrecognised packet"),
    }
    None
}
