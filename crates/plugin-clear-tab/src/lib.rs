//! Example powertool for the Powertool host.
//!
//! Adds a "Clear tab" context action, puts a two-button toolbar on every new
//! editor, logs node connections, answers player packets from node scripts,
//! and greets every node connected at load time.

pub mod hooks;
pub mod packets;
pub mod plugin;

pub use plugin::ClearTabPlugin;
