//! Node-side runtime: the in-process stand-in for a node's script channel.
//!
//! A real node runs script code that installs one reply hook and sends
//! packets to the host. [`NodeRuntime`] gives in-process nodes (tests, the
//! demo CLI) the same surface on top of the [`MessageBus`].

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use powertool_core::types::id::{NodeId, Token};

use crate::channel::bus::MessageBus;
use crate::channel::handler::Listener;
use crate::channel::reply::ReplyHandle;
use crate::message::types::{Payload, Receipt};
use crate::subscription::Subscription;

struct RuntimeInner {
    node_id: NodeId,
    host_id: NodeId,
    /// Attachment this runtime was created for.
    attachment: u64,
    bus: MessageBus,
    /// The installed reply hook; a node has at most one.
    hook: Mutex<Option<Subscription>>,
}

/// Handle to one connected node's side of the channel.
///
/// Bound to a single attachment of the node id: once the node is
/// disconnected the handle stays dead, even if the id is connected again.
/// Clones share the same hook slot.
#[derive(Clone)]
pub struct NodeRuntime {
    inner: Arc<RuntimeInner>,
}

impl NodeRuntime {
    pub(crate) fn new(node_id: NodeId, host_id: NodeId, attachment: u64, bus: MessageBus) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                node_id,
                host_id,
                attachment,
                bus,
                hook: Mutex::new(None),
            }),
        }
    }

    /// This node's id.
    pub fn node_id(&self) -> &NodeId {
        &self.inner.node_id
    }

    /// The host endpoint this node talks to.
    pub fn host_id(&self) -> &NodeId {
        &self.inner.host_id
    }

    /// Whether this runtime's attachment is still the live one.
    pub fn is_connected(&self) -> bool {
        self.inner.bus.attachment(&self.inner.node_id) == Some(self.inner.attachment)
    }

    /// Installs the node's reply hook, replacing any previous one.
    ///
    /// Until a hook is installed, packets addressed to this node are dropped.
    pub fn set_reply_hook<F>(&self, hook: F) -> bool
    where
        F: Fn(NodeId, Receipt, ReplyHandle) -> Option<Payload> + Send + Sync + 'static,
    {
        self.install(Listener::sync(hook))
    }

    /// Installs an async reply hook, replacing any previous one.
    pub fn set_reply_hook_async<F, Fut>(&self, hook: F) -> bool
    where
        F: Fn(NodeId, Receipt, ReplyHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<Payload>> + Send + 'static,
    {
        self.install(Listener::from_async(hook))
    }

    /// Removes the reply hook. Returns whether one was installed.
    pub fn clear_reply_hook(&self) -> bool {
        match self.inner.hook.lock().take() {
            Some(subscription) => subscription.cancel(),
            None => false,
        }
    }

    /// Whether a reply hook is installed.
    pub fn has_reply_hook(&self) -> bool {
        self.inner.hook.lock().is_some()
    }

    fn install(&self, listener: Listener) -> bool {
        if !self.is_connected() {
            debug!(node_id = %self.inner.node_id, "Reply hook not installed: node disconnected");
            return false;
        }
        let subscription = match self.inner.bus.listen(&self.inner.node_id, None, listener) {
            Ok(subscription) => subscription,
            Err(e) => {
                debug!(node_id = %self.inner.node_id, error = %e, "Reply hook not installed");
                return false;
            }
        };

        let previous = self.inner.hook.lock().replace(subscription);
        if let Some(previous) = previous {
            previous.cancel();
        }
        true
    }

    /// Sends a packet to the host. With a token the host may reply once.
    ///
    /// A node that has been disconnected sends nothing.
    pub fn send(&self, token: Option<Token>, payload: impl Into<Payload>) {
        self.inner.bus.send_attached(
            &self.inner.node_id,
            self.inner.attachment,
            &self.inner.host_id,
            token,
            payload,
        );
    }
}

impl std::fmt::Debug for NodeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRuntime")
            .field("node_id", &self.inner.node_id)
            .field("host_id", &self.inner.host_id)
            .field("attachment", &self.inner.attachment)
            .field("has_reply_hook", &self.has_reply_hook())
            .finish()
    }
}
