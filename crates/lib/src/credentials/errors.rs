//! Error types for the credential store
use thiserror::Error;

/// Errors raised by credential records and their hashing.
///
/// Wrong passwords are not errors at this layer: [`verify_credential`]
/// returns `Ok(false)`, and the provider turns that into
/// [`CredentialError::InvalidCredential`].
///
/// [`verify_credential`]: super::CredentialStore::verify_credential
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Username already exists: {username}")]
    DuplicateUsername { username: String },

    #[error("Credential not found: {username}")]
    NotFound { username: String },

    #[error("Invalid username or password")]
    InvalidCredential,

    #[error("Username must not be empty")]
    EmptyUsername,

    #[error("Password hashing failed: {reason}")]
    HashingFailed { reason: String },

    #[error("Stored credential for {username} is malformed: {reason}")]
    InvalidRecord { username: String, reason: String },
}

impl CredentialError {
    /// Check if this error indicates the credential was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CredentialError::NotFound { .. })
    }

    /// Check if this error indicates a username conflict.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, CredentialError::DuplicateUsername { .. })
    }

    /// Check if this error is an expected authentication failure.
    pub fn is_invalid_credential(&self) -> bool {
        matches!(self, CredentialError::InvalidCredential)
    }
}

impl From<CredentialError> for crate::Error {
    fn from(err: CredentialError) -> Self {
        crate::Error::Credential(err)
    }
}
