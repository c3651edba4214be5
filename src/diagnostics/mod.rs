//! Error handling for the type-order engine.
//!
//! Queries distinguish programmer bugs (surfaced as the errors below, which
//! abort the query) from expected negative answers (plain `false` or `None`)
//! and from data-model gaps, which the outermost lattice and solver entry
//! points catch and degrade on.

pub mod error;

pub use error::*;

/// Result type used throughout the engine.
pub type Result<T> = std::result::Result<T, Box<Error>>;
