//! Unified error types for the converter.
//!
//! This module provides a single error type covering malformed input,
//! invalid event streams, collaborator failures and configuration problems.

// Submodule declarations
pub mod types;
pub mod conversions;

// Re-exports
pub use types::{Error, Result};
