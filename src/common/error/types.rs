//! Unified error types for the office service.
//!
//! Every operation reports failures through one of these kinds. The
//! transport layer is the only place a kind is translated into a status.
use thiserror::Error;

/// Main error type for document operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced sheet, style, layout or file path does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Paragraph, slide or shape index outside `[0, count)`
    #[error("{what} index {index} out of range (count {count})")]
    OutOfRange {
        what: &'static str,
        index: i64,
        count: usize,
    },

    /// Malformed cell or range address
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// The file cannot be parsed as the expected container format
    #[error("Corrupt container: {0}")]
    CorruptContainer(String),

    /// Filesystem failure on read, write or directory creation
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A parameter value that cannot be applied (bad color, empty name, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "NOT_FOUND",
            Error::OutOfRange { .. } => "OUT_OF_RANGE",
            Error::InvalidReference(_) => "INVALID_REFERENCE",
            Error::CorruptContainer(_) => "CORRUPT_CONTAINER",
            Error::Io(_) => "IO_ERROR",
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
        }
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Error::CorruptContainer(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

/// Result type for office service operations.
pub type Result<T> = std::result::Result<T, Error>;
