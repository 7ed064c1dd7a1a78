//! Storage error types for the Keyward library.
//!
//! Errors raised while reading or writing persisted documents. These are the
//! `IOFailure` class of the error taxonomy: they are never retried internally.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing a persisted document.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StorageError {
    /// File I/O error.
    #[error("File I/O error on {path}")]
    FileIo {
        /// The file or directory being accessed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Serialization failed.
    #[error("Serialization of document '{key}' failed")]
    SerializationFailed {
        /// Storage key of the document
        key: String,
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization of {path} failed")]
    DeserializationFailed {
        /// The file that could not be parsed
        path: PathBuf,
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// The document was written by an unsupported format version.
    #[error("Unsupported version {found} for document '{key}'; only version {supported} is supported")]
    UnsupportedVersion {
        /// Storage key of the document
        key: String,
        /// Version found on disk
        found: u32,
        /// Version this build understands
        supported: u32,
    },

    /// The file holds a document stored under a different key.
    #[error("Document key mismatch: expected '{expected}', found '{found}'")]
    KeyMismatch {
        /// The key the caller asked for
        expected: String,
        /// The key recorded in the file
        found: String,
    },

    /// A stored value could not be decoded.
    #[error("Invalid stored value: {reason}")]
    InvalidValue {
        /// Description of the problem
        reason: String,
    },
}

impl StorageError {
    /// Check if this error came from the filesystem.
    pub fn is_io_error(&self) -> bool {
        matches!(self, StorageError::FileIo { .. })
    }

    /// Check if this error indicates corrupt or incompatible stored data.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            StorageError::DeserializationFailed { .. }
                | StorageError::UnsupportedVersion { .. }
                | StorageError::KeyMismatch { .. }
                | StorageError::InvalidValue { .. }
        )
    }
}

impl From<StorageError> for crate::Error {
    fn from(err: StorageError) -> Self {
        crate::Error::Storage(err)
    }
}
