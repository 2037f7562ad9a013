//! JSON serialization for node wire frames.

use serde_json;

use powertool_core::error::AppError;

use super::frame::{HostFrame, NodeFrame};
use super::validator;

/// Serialize a host→node frame to JSON
pub fn serialize_host_frame(frame: &HostFrame) -> Result<String, serde_json::Error> {
    serde_json::to_string(frame)
}

/// Serialize a node→host frame to JSON
pub fn serialize_node_frame(frame: &NodeFrame) -> Result<String, serde_json::Error> {
    serde_json::to_string(frame)
}

/// Validate and deserialize a node→host frame.
pub fn deserialize_node_frame(text: &str, max_bytes: usize) -> Result<NodeFrame, AppError> {
    validator::validate_frame(text, max_bytes)?;
    let frame: NodeFrame = serde_json::from_str(text)?;
    if let NodeFrame::Ipc {
        reply: Some(token), ..
    }
    | NodeFrame::Reply { token, .. } = &frame
    {
        validator::validate_token(token)?;
    }
    Ok(frame)
}
