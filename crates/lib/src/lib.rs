//!
//! Keyward: credential issuance and token lifecycle for service accounts.
//! This library provides the components for registering password credentials,
//! managing user identities and minting bearer tokens that survive restarts.
//!
//! ## Core Concepts
//!
//! * **Credential stores (`credentials::CredentialStore`)**: Durable username/password-hash records for one provider, hashed with Argon2id.
//! * **Auth providers (`provider::AuthProvider`)**: Pluggable credential mechanisms. The built-in `local` provider wraps a credential store.
//! * **Identity directory (`identity::IdentityDirectory`)**: Users and their group memberships, linked to provider credentials.
//! * **Token manager (`token::TokenManager`)**: Refresh tokens bound to a user and client, and the signed, short-lived access tokens derived from them.
//! * **Persistence coordinator (`persistence::PersistenceCoordinator`)**: Ordered, atomic flushing of all of the above to JSON documents.
//! * **Auth manager (`AuthManager`)**: The facade wiring everything together from one [`AuthConfig`].

pub mod clock;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod identity;
pub mod manager;
pub mod persistence;
pub mod provider;
pub mod storage;
pub mod token;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use config::AuthConfig;
pub use manager::AuthManager;

/// Result type used throughout the Keyward library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Keyward library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured storage errors from the storage module
    #[error(transparent)]
    Storage(storage::StorageError),

    /// Structured credential errors from the credentials module
    #[error(transparent)]
    Credential(credentials::CredentialError),

    /// Structured provider errors from the provider module
    #[error(transparent)]
    Provider(provider::ProviderError),

    /// Structured identity errors from the identity module
    #[error(transparent)]
    Identity(identity::IdentityError),

    /// Structured token errors from the token module
    #[error(transparent)]
    Token(token::TokenError),

    /// Structured persistence errors from the persistence module
    #[error(transparent)]
    Persistence(persistence::PersistenceError),

    /// Structured configuration errors from the config module
    #[error(transparent)]
    Config(config::ConfigError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Storage(_) => "storage",
            Error::Credential(_) => "credentials",
            Error::Provider(_) => "provider",
            Error::Identity(_) => "identity",
            Error::Token(_) => "token",
            Error::Persistence(_) => "persistence",
            Error::Config(_) => "config",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Credential(err) => err.is_not_found(),
            Error::Identity(err) => err.is_not_found(),
            Error::Token(err) => err.is_not_found(),
            Error::Provider(err) => matches!(err, provider::ProviderError::ProviderNotFound { .. }),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Credential(err) => err.is_duplicate(),
            Error::Identity(err) => err.is_conflict(),
            Error::Token(err) => matches!(err, token::TokenError::DuplicateClientName { .. }),
            Error::Provider(err) => matches!(
                err,
                provider::ProviderError::AlreadyInitialized { .. }
                    | provider::ProviderError::DuplicateProvider { .. }
            ),
            _ => false,
        }
    }

    /// Check if this error is a rejected username/password pair.
    pub fn is_invalid_credential(&self) -> bool {
        match self {
            Error::Credential(err) => err.is_invalid_credential(),
            _ => false,
        }
    }

    /// Check if this error indicates a revoked refresh token.
    pub fn is_revoked(&self) -> bool {
        match self {
            Error::Token(err) => err.is_revoked(),
            _ => false,
        }
    }

    /// Check if this error indicates an expired token.
    pub fn is_expired(&self) -> bool {
        match self {
            Error::Token(err) => err.is_expired(),
            _ => false,
        }
    }

    /// Check if this error means a presented token must be rejected.
    pub fn is_token_rejection(&self) -> bool {
        match self {
            Error::Token(err) => err.is_rejection(),
            _ => false,
        }
    }

    /// Check if this error indicates a user that may not authenticate.
    pub fn is_inactive_user(&self) -> bool {
        match self {
            Error::Identity(err) => err.is_inactive(),
            Error::Token(err) => matches!(err, token::TokenError::UserInactive { .. }),
            _ => false,
        }
    }

    /// Check if this error is a component used before it was initialized.
    pub fn is_initialization_error(&self) -> bool {
        match self {
            Error::Provider(err) => err.is_initialization_error(),
            _ => false,
        }
    }

    /// Check if this error is I/O related, including failed flushes.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Storage(err) => err.is_io_error(),
            Error::Persistence(_) => true,
            Error::Config(err) => matches!(err, config::ConfigError::Read { .. }),
            _ => false,
        }
    }

    /// Check if this error indicates corrupt or incompatible stored data.
    pub fn is_format_error(&self) -> bool {
        match self {
            Error::Storage(err) => err.is_format_error(),
            Error::Credential(err) => matches!(err, credentials::CredentialError::InvalidRecord { .. }),
            _ => false,
        }
    }

    /// Check if this error comes from invalid input to a create/update call.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Credential(err) => matches!(err, credentials::CredentialError::EmptyUsername),
            Error::Token(err) => err.is_validation_error(),
            Error::Provider(err) => err.is_configuration_error(),
            Error::Config(_) => true,
            _ => false,
        }
    }
}
