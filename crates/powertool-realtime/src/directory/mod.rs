//! Node directory: the live set of connected nodes and its observers.

pub mod directory;
pub mod node;
pub mod observers;
pub mod stream;

pub use directory::{NodeDirectory, NodeView};
pub use node::NodeInfo;
pub use observers::{NodeCallback, ObserverList};
pub use stream::NodeEventStream;
