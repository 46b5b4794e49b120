//! Error types for xml-settings

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for settings store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the settings store
#[derive(Error, Debug)]
pub enum Error {
    // -------------------------------------------------------------------------
    // Argument Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Document Errors
    // -------------------------------------------------------------------------
    #[error("Unable to parse settings file: {0}")]
    Parse(String),

    #[error("Failed to load settings file '{path}': {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Failed to serialize settings document: {0}")]
    Serialize(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for an [`Error::InvalidArgument`]
    pub(crate) fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// Check if this error rejected a caller-supplied argument
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument { .. })
    }

    /// Name of the rejected parameter (`"section"`, `"key"` or `"value"`)
    #[must_use]
    pub fn argument_name(&self) -> Option<&'static str> {
        match self {
            Error::InvalidArgument { name, .. } => Some(*name),
            _ => None,
        }
    }

    /// Check if this is a filesystem error
    #[must_use]
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            Error::FileRead { .. } | Error::FileWrite { .. } | Error::DirectoryCreate { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_names_parameter() {
        let err = Error::invalid_argument("section", "must not be empty");

        assert!(err.is_invalid_argument());
        assert!(!err.is_io_error());
        assert_eq!(err.argument_name(), Some("section"));
        assert_eq!(
            err.to_string(),
            "Invalid argument 'section': must not be empty"
        );
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let err = Error::FileWrite {
            path: PathBuf::from("/tmp/settings.xml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };

        assert!(err.is_io_error());
        assert_eq!(err.argument_name(), None);
        assert!(err.source().is_some());
    }
}
