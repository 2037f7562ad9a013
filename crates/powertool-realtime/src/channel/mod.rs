//! Messaging channel: endpoints, listeners, and reply handles.
//!
//! Delivery is best effort and at-most-once. Senders never learn whether
//! an envelope arrived; dropped envelopes are logged and counted in
//! [`crate::metrics::ChannelMetrics`].

pub mod bus;
pub mod endpoint;
pub mod handler;
pub mod reply;

pub use bus::MessageBus;
pub use handler::Listener;
pub use reply::ReplyHandle;
