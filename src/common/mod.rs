//! Common types and utilities shared across formats.

// Submodule declarations
pub mod color;
pub mod error;
pub mod unit;
pub mod xml;

// Re-exports for convenience
pub use error::{Error, Result};
pub use xml::{XmlDocument, XmlElement};
