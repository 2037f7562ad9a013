//! At-most-once reply handles.

use std::sync::Weak;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use powertool_core::types::id::{NodeId, PluginId, Token};

use super::bus::BusShared;
use crate::message::envelope::Envelope;
use crate::message::types::Payload;

struct ReplyState {
    bus: Weak<BusShared>,
    /// Endpoint answering (the receiver of the request).
    from: NodeId,
    /// Endpoint that sent the request.
    to: NodeId,
    token: Option<Token>,
    /// Plugin that sent the request, if any.
    plugin: Option<PluginId>,
    spent: AtomicBool,
}

/// Sends one reply to the originator of a request.
///
/// Clones share state: across every listener that saw the same envelope,
/// only the first `reply` call sends anything.
#[derive(Clone)]
pub struct ReplyHandle {
    state: Arc<ReplyState>,
    /// Owner of the listener holding this clone.
    responder: Option<PluginId>,
}

impl ReplyHandle {
    pub(crate) fn new(
        bus: Weak<BusShared>,
        from: NodeId,
        to: NodeId,
        token: Option<Token>,
        plugin: Option<PluginId>,
    ) -> Self {
        Self {
            state: Arc::new(ReplyState {
                bus,
                from,
                to,
                token,
                plugin,
                spent: AtomicBool::new(false),
            }),
            responder: None,
        }
    }

    /// A clone sharing the same at-most-once state, answering as `responder`.
    pub(crate) fn for_responder(&self, responder: Option<PluginId>) -> Self {
        Self {
            state: self.state.clone(),
            responder,
        }
    }

    /// Sends `payload` back to the requester, tagged with the request token.
    ///
    /// Returns `true` if a reply envelope was handed to the bus. Returns
    /// `false` without side effects when the request carried no token or a
    /// reply was already sent. A `true` result does not mean the reply
    /// arrived: the requester may have disconnected or have no listener.
    pub fn reply(&self, payload: impl Into<Payload>) -> bool {
        let Some(token) = self.state.token.clone() else {
            debug!(to = %self.state.to, "Reply ignored: request carried no token");
            return false;
        };

        if self.state.spent.swap(true, Ordering::SeqCst) {
            debug!(to = %self.state.to, token = %token, "Reply ignored: already replied");
            return false;
        }

        let Some(bus) = self.state.bus.upgrade() else {
            debug!(to = %self.state.to, token = %token, "Reply dropped: bus is gone");
            return false;
        };

        let plugin = self.state.plugin.clone().or_else(|| self.responder.clone());
        let envelope = Envelope::reply(
            self.state.from.clone(),
            self.state.to.clone(),
            token,
            payload.into(),
        )
        .with_plugin(plugin);
        bus.route(envelope);
        bus.metrics.record_reply();
        true
    }

    /// The token a reply would carry.
    pub fn token(&self) -> Option<&Token> {
        self.state.token.as_ref()
    }

    /// Whether calling [`ReplyHandle::reply`] could send anything.
    pub fn can_reply(&self) -> bool {
        self.state.token.is_some() && !self.is_spent()
    }

    /// Whether a reply has already been sent.
    pub fn is_spent(&self) -> bool {
        self.state.spent.load(Ordering::SeqCst)
    }

    /// The endpoint the reply would go to.
    pub fn requester(&self) -> &NodeId {
        &self.state.to
    }
}

impl std::fmt::Debug for ReplyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyHandle")
            .field("from", &self.state.from)
            .field("to", &self.state.to)
            .field("token", &self.state.token)
            .field("plugin", &self.state.plugin)
            .field("spent", &self.is_spent())
            .finish()
    }
}
