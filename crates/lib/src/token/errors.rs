//! Error types for refresh and access tokens
use thiserror::Error;

/// Errors raised by the token manager.
///
/// `Revoked` and `Expired` are expected outcomes of checking a token, not
/// faults; callers should match on them rather than treat them as failures
/// of the subsystem.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Refresh token not found: {token_id}")]
    NotFound { token_id: String },

    #[error("Refresh token {token_id} has been revoked")]
    Revoked { token_id: String },

    #[error("Token {token_id} has expired")]
    Expired { token_id: String },

    #[error("User {user_id} is not active")]
    UserInactive { user_id: String },

    #[error("Long-lived tokens require an explicit access token expiration")]
    MissingAccessTokenExpiration,

    #[error("Long-lived tokens require a client name")]
    MissingClientName,

    #[error("A long-lived token for client '{client_name}' already exists for this user")]
    DuplicateClientName { client_name: String },

    #[error("Invalid expiration: {reason}")]
    InvalidExpiration { reason: String },

    #[error("Invalid access token: {reason}")]
    InvalidAccessToken { reason: String },
}

impl TokenError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TokenError::NotFound { .. })
    }

    pub fn is_revoked(&self) -> bool {
        matches!(self, TokenError::Revoked { .. })
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, TokenError::Expired { .. })
    }

    /// Check if this error means a presented token must be rejected.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TokenError::NotFound { .. }
                | TokenError::Revoked { .. }
                | TokenError::Expired { .. }
                | TokenError::UserInactive { .. }
                | TokenError::InvalidAccessToken { .. }
        )
    }

    /// Check if this error comes from invalid token creation options.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            TokenError::MissingAccessTokenExpiration
                | TokenError::MissingClientName
                | TokenError::DuplicateClientName { .. }
                | TokenError::InvalidExpiration { .. }
        )
    }
}

impl From<TokenError> for crate::Error {
    fn from(err: TokenError) -> Self {
        crate::Error::Token(err)
    }
}
