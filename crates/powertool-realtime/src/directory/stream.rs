//! Per-subscriber stream of node transitions.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

use powertool_core::events::NodeEvent;

/// Independent stream of mount/unmount events.
///
/// Each call to `NodeView::subscribe` creates a fresh stream that starts at
/// the moment of subscription; it does not replay earlier transitions.
#[derive(Debug)]
pub struct NodeEventStream {
    rx: broadcast::Receiver<NodeEvent>,
}

impl NodeEventStream {
    pub(crate) fn new(rx: broadcast::Receiver<NodeEvent>) -> Self {
        Self { rx }
    }

    /// Waits for the next transition. Returns `None` once the directory is
    /// gone. Events lost to a slow consumer are skipped with a warning.
    pub async fn next(&mut self) -> Option<NodeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "Node event stream lagged, events skipped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next already-buffered transition without waiting.
    pub fn try_next(&mut self) -> Option<NodeEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "Node event stream lagged, events skipped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}
