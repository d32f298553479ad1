//! Error types shared by every redaction pipeline

use std::fmt;
use std::io;

/// Errors raised while locating or removing a slide label
#[derive(Debug)]
pub enum ScrubError {
    /// I/O error (open, read, seek, write, short write, permission denied)
    IoError(io::Error),
    /// The input could not be classified as a supported slide format
    UnrecognizedFormat(String),
    /// A directory or index structure does not have the expected shape
    MalformedContainer(String),
    /// The container is well formed but carries no label image
    LabelNotFound(String),
    /// Invalid byte order marker in a TIFF header
    InvalidByteOrder(u16),
    /// Unsupported TIFF version number
    UnsupportedVersion(u16),
    /// Tag value has a field type we do not decode
    UnsupportedFieldType(u16),
    /// Configuration file or flag could not be interpreted
    InvalidConfig(String),
}

impl ScrubError {
    /// Shorthand for a `MalformedContainer` error
    pub fn malformed(msg: impl Into<String>) -> Self {
        ScrubError::MalformedContainer(msg.into())
    }

    /// Returns true for conditions reported as warnings rather than failures
    pub fn is_warning(&self) -> bool {
        matches!(self, ScrubError::LabelNotFound(_))
    }
}

impl fmt::Display for ScrubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrubError::IoError(e) => write!(f, "I/O error: {}", e),
            ScrubError::UnrecognizedFormat(msg) => write!(f, "Unrecognized file type: {}", msg),
            ScrubError::MalformedContainer(msg) => write!(f, "Malformed container: {}", msg),
            ScrubError::LabelNotFound(msg) => write!(f, "Label not found: {}", msg),
            ScrubError::InvalidByteOrder(v) => write!(f, "Invalid byte order marker: {:#06x}", v),
            ScrubError::UnsupportedVersion(v) => write!(f, "Unsupported TIFF version: {}", v),
            ScrubError::UnsupportedFieldType(ft) => write!(f, "Unsupported field type: {}", ft),
            ScrubError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ScrubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScrubError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ScrubError {
    fn from(error: io::Error) -> Self {
        ScrubError::IoError(error)
    }
}

/// Result type for redaction operations
pub type ScrubResult<T> = Result<T, ScrubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_label_not_found_is_a_warning() {
        assert!(ScrubError::LabelNotFound("no label".into()).is_warning());
        assert!(!ScrubError::malformed("bad").is_warning());
        assert!(!ScrubError::UnrecognizedFormat("x".into()).is_warning());
    }

    #[test]
    fn test_io_error_conversion_keeps_source() {
        let err: ScrubError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, ScrubError::IoError(_)));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("denied"));
    }
}
