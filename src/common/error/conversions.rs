//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from internal
//! error types to the unified Error type.

use super::types::Error;
use crate::ooxml::opc::error::OpcError;

impl From<OpcError> for Error {
    fn from(err: OpcError) -> Self {
        match err {
            OpcError::PackageNotFound(path) => Error::NotFound(format!("file {}", path)),
            OpcError::IoError(e) => Error::Io(e),
            other => Error::CorruptContainer(other.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::CorruptContainer(format!("XML error: {}", err))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::CorruptContainer(format!("ZIP error: {}", err))
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io(err.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opc_errors_map_to_taxonomy() {
        let err: Error = OpcError::PackageNotFound("/tmp/missing.docx".to_string()).into();
        assert!(matches!(err, Error::NotFound(_)));

        let err: Error = OpcError::XmlError("unexpected eof".to_string()).into();
        match err {
            Error::CorruptContainer(msg) => assert!(msg.contains("unexpected eof")),
            other => panic!("unexpected {:?}", other),
        }

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = OpcError::IoError(io).into();
        assert!(matches!(err, Error::Io(_)));
    }
}
