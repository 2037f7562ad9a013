//! Listener callbacks invoked for inbound envelopes.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use powertool_core::types::id::NodeId;

use super::reply::ReplyHandle;
use crate::message::types::{Payload, Receipt};

/// Synchronous listener: runs on the endpoint's delivery task.
pub type SyncListener = Arc<dyn Fn(NodeId, Receipt, ReplyHandle) -> Option<Payload> + Send + Sync>;

/// Asynchronous listener: its future is spawned, so awaiting inside it never
/// holds up delivery of later envelopes.
pub type AsyncListener =
    Arc<dyn Fn(NodeId, Receipt, ReplyHandle) -> BoxFuture<'static, Option<Payload>> + Send + Sync>;

/// A listener installed on an endpoint.
///
/// Arguments are the sending endpoint, the receipt, and a reply handle. A
/// returned `Some(payload)` is sent as the reply if the handler has not
/// already replied explicitly.
#[derive(Clone)]
pub enum Listener {
    /// Inline handler.
    Sync(SyncListener),
    /// Spawned handler.
    Async(AsyncListener),
}

impl Listener {
    /// Wraps a synchronous closure.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(NodeId, Receipt, ReplyHandle) -> Option<Payload> + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(f))
    }

    /// Wraps an async closure.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(NodeId, Receipt, ReplyHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<Payload>> + Send + 'static,
    {
        Self::Async(Arc::new(move |from, receipt, reply| {
            Box::pin(f(from, receipt, reply)) as BoxFuture<'static, Option<Payload>>
        }))
    }

    /// Whether this listener runs on a spawned task.
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Listener::Sync(<closure>)"),
            Self::Async(_) => f.write_str("Listener::Async(<closure>)"),
        }
    }
}
