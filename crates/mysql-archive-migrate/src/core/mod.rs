//! Core abstractions shared by the write path.
//!
//! - [`conn`]: the capability contract a target session must provide
//! - [`identifier`]: allow-list validation and quoting for SQL identifiers
//! - [`value`]: SQL value representation and the ordered row mapping
//!
//! The adapter in [`crate::target`] is written entirely against these types;
//! the concrete driver lives behind the [`conn::TargetConnection`] trait so
//! the write/allocation logic can be tested with a scripted session.

pub mod conn;
pub mod identifier;
pub mod value;

// Re-export commonly used types for convenience
pub use conn::TargetConnection;
pub use value::{Row, SqlValue};
