//! Envelope framing for messages on the bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use powertool_core::types::id::{NodeId, PluginId, Token};

use super::types::{Payload, Receipt};

/// Whether an envelope starts an exchange or answers one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    /// A request; reply-enabled when it carries a token.
    Request,
    /// A reply; its token is the request's correlation token.
    Reply,
}

/// A single message in flight between two endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Unique message id, for logs.
    pub id: Uuid,
    /// Sending endpoint.
    pub source: NodeId,
    /// Receiving endpoint.
    pub target: NodeId,
    /// Correlation token (reply token on requests, correlation on replies).
    pub token: Option<Token>,
    /// Host plugin the exchange belongs to. On a host request it is the
    /// sending plugin; on a reply it is the plugin being answered, or the
    /// plugin answering a node request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<PluginId>,
    /// Request or reply.
    pub kind: EnvelopeKind,
    /// Payload.
    pub payload: Payload,
    /// Sequence number per source→target pair, assigned by the bus.
    pub seq: u64,
    /// When the envelope was created.
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    fn new(
        source: NodeId,
        target: NodeId,
        token: Option<Token>,
        kind: EnvelopeKind,
        payload: Payload,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            target,
            token,
            plugin: None,
            kind,
            payload,
            seq: 0,
            timestamp: Utc::now(),
        }
    }

    /// Creates a request. With a token the receiver may reply once.
    pub fn request(source: NodeId, target: NodeId, token: Option<Token>, payload: Payload) -> Self {
        Self::new(source, target, token, EnvelopeKind::Request, payload)
    }

    /// Creates a reply to the request that carried `token`.
    pub fn reply(source: NodeId, target: NodeId, token: Token, payload: Payload) -> Self {
        Self::new(source, target, Some(token), EnvelopeKind::Reply, payload)
    }

    /// Tags the envelope with the host plugin it belongs to.
    pub fn with_plugin(mut self, plugin: Option<PluginId>) -> Self {
        self.plugin = plugin;
        self
    }

    /// Whether a listener owned by `owner` should see this envelope.
    ///
    /// Replies tagged with a plugin go only to that plugin's listeners and to
    /// unowned listeners. Requests go to everyone.
    pub fn is_visible_to(&self, owner: Option<&PluginId>) -> bool {
        match (self.kind, &self.plugin, owner) {
            (EnvelopeKind::Reply, Some(plugin), Some(owner)) => plugin == owner,
            _ => true,
        }
    }

    /// Token the receiver should echo back, if this is a reply-enabled request.
    pub fn reply_token(&self) -> Option<&Token> {
        match self.kind {
            EnvelopeKind::Request => self.token.as_ref(),
            EnvelopeKind::Reply => None,
        }
    }

    /// Token of the request this envelope answers, if it is a reply.
    pub fn correlation(&self) -> Option<&Token> {
        match self.kind {
            EnvelopeKind::Reply => self.token.as_ref(),
            EnvelopeKind::Request => None,
        }
    }

    /// Converts the envelope into what a listener sees.
    pub fn to_receipt(&self) -> Receipt {
        Receipt {
            payload: self.payload.clone(),
            reply_token: self.reply_token().cloned(),
            correlation: self.correlation().cloned(),
            plugin: self.plugin.clone(),
            seq: self.seq,
            sent_at: self.timestamp,
        }
    }
}
