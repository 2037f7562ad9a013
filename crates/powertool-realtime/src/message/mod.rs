//! Envelopes, receipts, node wire frames, codec, and validation.

pub mod envelope;
pub mod frame;
pub mod serializer;
pub mod types;
pub mod validator;

pub use envelope::{Envelope, EnvelopeKind};
pub use frame::NodeFrame;
pub use types::{Payload, Receipt};
