//! Unified error types for the office service.
//!
//! This module provides the error taxonomy shared by the codec adapters,
//! the position resolver and the mutation engines.

// Submodule declarations
pub mod types;
pub mod conversions;

// Re-exports
pub use types::{Error, Result};
