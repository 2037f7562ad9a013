//! Messaging channel configuration.

use serde::{Deserialize, Serialize};

/// Settings for the node directory and the message bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Bounded inbox size per endpoint. Envelopes beyond this are dropped.
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
    /// Maximum encoded payload size in bytes. Larger payloads are dropped.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    /// Maximum size of a raw inbound node frame. Must leave room for the
    /// frame wrapper around a payload of `max_payload_bytes`.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Buffer size of the node event broadcast channel.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: default_inbox_capacity(),
            max_payload_bytes: default_max_payload_bytes(),
            max_frame_bytes: default_max_frame_bytes(),
            event_buffer_size: default_event_buffer_size(),
        }
    }
}

fn default_inbox_capacity() -> usize {
    256
}

fn default_max_payload_bytes() -> usize {
    65_536
}

fn default_max_frame_bytes() -> usize {
    default_max_payload_bytes() + 4_096
}

fn default_event_buffer_size() -> usize {
    64
}
