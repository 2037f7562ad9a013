//! # powertool-realtime
//!
//! Connection-facing half of the Powertool host. Provides:
//!
//! - The node directory: live set of mounted nodes, mount/unmount observers
//!   and per-subscriber event streams
//! - The message bus: per-endpoint inboxes, correlation-token request/reply
//!   and at-most-once reply handles
//! - Node wire frames with validation and JSON codec
//! - The connection manager (sole writer of the node set) and a node-side
//!   runtime used to drive nodes in-process
//! - Channel metrics

pub mod channel;
pub mod connection;
pub mod directory;
pub mod message;
pub mod metrics;
pub mod server;
pub mod subscription;

pub use channel::bus::MessageBus;
pub use channel::handler::Listener;
pub use channel::reply::ReplyHandle;
pub use connection::manager::ConnectionManager;
pub use connection::runtime::NodeRuntime;
pub use directory::directory::{NodeDirectory, NodeView};
pub use directory::node::NodeInfo;
pub use directory::stream::NodeEventStream;
pub use message::types::{Payload, Receipt};
pub use metrics::{ChannelMetrics, MetricsSnapshot};
pub use server::RealtimeEngine;
pub use subscription::Subscription;
