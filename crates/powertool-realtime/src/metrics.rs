//! Channel and directory counters.
//!
//! Best-effort delivery never reports failures to callers, so these counters
//! are the only place dropped envelopes become visible.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Host-wide messaging counters.
#[derive(Debug, Default)]
pub struct ChannelMetrics {
    /// Envelopes accepted into a target inbox.
    pub messages_sent: AtomicU64,
    /// Envelopes handed to at least one listener.
    pub messages_delivered: AtomicU64,
    /// Replies sent through a reply handle.
    pub replies_sent: AtomicU64,
    /// Dropped: target endpoint not attached.
    pub dropped_undeliverable: AtomicU64,
    /// Dropped: target inbox full.
    pub dropped_overflow: AtomicU64,
    /// Dropped: payload above the size limit.
    pub dropped_oversize: AtomicU64,
    /// Dropped: target had no listener installed.
    pub dropped_unhandled: AtomicU64,
    /// Listener invocations that panicked.
    pub listener_panics: AtomicU64,
    /// Total mount transitions.
    pub nodes_mounted: AtomicU64,
    /// Total unmount transitions.
    pub nodes_unmounted: AtomicU64,
}

impl ChannelMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self) {
        self.messages_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reply(&self) {
        self.replies_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_undeliverable(&self) {
        self.dropped_undeliverable.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_overflow(&self) {
        self.dropped_overflow.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_oversize(&self) {
        self.dropped_oversize.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unhandled(&self) {
        self.dropped_unhandled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_listener_panic(&self) {
        self.listener_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_mount(&self) {
        self.nodes_mounted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unmount(&self) {
        self.nodes_unmounted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            replies_sent: self.replies_sent.load(Ordering::Relaxed),
            dropped_undeliverable: self.dropped_undeliverable.load(Ordering::Relaxed),
            dropped_overflow: self.dropped_overflow.load(Ordering::Relaxed),
            dropped_oversize: self.dropped_oversize.load(Ordering::Relaxed),
            dropped_unhandled: self.dropped_unhandled.load(Ordering::Relaxed),
            listener_panics: self.listener_panics.load(Ordering::Relaxed),
            nodes_mounted: self.nodes_mounted.load(Ordering::Relaxed),
            nodes_unmounted: self.nodes_unmounted.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Envelopes accepted into a target inbox
    pub messages_sent: u64,
    /// Envelopes handed to listeners
    pub messages_delivered: u64,
    /// Replies sent
    pub replies_sent: u64,
    /// Dropped for unknown target
    pub dropped_undeliverable: u64,
    /// Dropped for full inbox
    pub dropped_overflow: u64,
    /// Dropped for payload size
    pub dropped_oversize: u64,
    /// Dropped for missing listener
    pub dropped_unhandled: u64,
    /// Listener panics
    pub listener_panics: u64,
    /// Mount transitions
    pub nodes_mounted: u64,
    /// Unmount transitions
    pub nodes_unmounted: u64,
}

impl MetricsSnapshot {
    /// Total envelopes dropped for any reason.
    pub fn dropped_total(&self) -> u64 {
        self.dropped_undeliverable
            + self.dropped_overflow
            + self.dropped_oversize
            + self.dropped_unhandled
    }
}
