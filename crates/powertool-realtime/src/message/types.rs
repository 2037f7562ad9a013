//! Payload and receipt types seen by listeners.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use powertool_core::error::AppError;
use powertool_core::types::id::{PluginId, Token};

/// Opaque message payload.
pub type Payload = serde_json::Value;

/// What a listener receives for one inbound envelope.
///
/// Instead of poking at loosely shaped fields, listeners either read
/// [`Receipt::payload`] as a raw value or call [`Receipt::decode`] to get a
/// typed struct; a shape mismatch is a `Serialization` error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// The payload as sent.
    pub payload: Payload,
    /// Set on reply-enabled requests: the token the sender wants echoed back.
    pub reply_token: Option<Token>,
    /// Set on replies: the token of the request being answered.
    pub correlation: Option<Token>,
    /// Host plugin involved: the sending plugin on a host request, or the
    /// answering plugin on a reply to a node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<PluginId>,
    /// Per source→target sequence number.
    pub seq: u64,
    /// When the envelope was created by the sender.
    pub sent_at: DateTime<Utc>,
}

impl Receipt {
    /// Decodes the payload into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            AppError::with_source(
                powertool_core::error::ErrorKind::Serialization,
                format!("Payload does not match expected shape: {e}"),
                e,
            )
        })
    }

    /// Whether this receipt answers an earlier request.
    pub fn is_reply(&self) -> bool {
        self.correlation.is_some()
    }

    /// Whether the sender asked for a reply.
    pub fn wants_reply(&self) -> bool {
        self.reply_token.is_some()
    }

    /// The payload as a string slice, when it is a JSON string.
    pub fn as_str(&self) -> Option<&str> {
        self.payload.as_str()
    }
}
