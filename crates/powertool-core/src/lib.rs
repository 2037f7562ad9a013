//! # powertool-core
//!
//! Core crate for the Powertool extension host. Contains configuration
//! schemas, typed identifiers, node lifecycle events, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other Powertool crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
