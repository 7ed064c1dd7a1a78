//! Error types for auth providers
use thiserror::Error;

/// Errors raised by the provider layer itself.
///
/// Credential problems (duplicate usernames, bad passwords) surface as
/// [`CredentialError`](crate::credentials::CredentialError) instead.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProviderError {
    /// A provider was used before `initialize()`. This is a programming
    /// error in the caller and is not worth retrying.
    #[error("Auth provider {provider} used before initialize()")]
    NotInitialized { provider: String },

    #[error("Auth provider {provider} is already initialized")]
    AlreadyInitialized { provider: String },

    #[error("Unknown auth provider type: {provider_type}")]
    UnknownProviderType { provider_type: String },

    #[error("Auth provider configured more than once: {provider}")]
    DuplicateProvider { provider: String },

    #[error("Auth provider not found: {provider}")]
    ProviderNotFound { provider: String },
}

impl ProviderError {
    /// Check if this error is an initialization ordering mistake.
    pub fn is_initialization_error(&self) -> bool {
        matches!(
            self,
            ProviderError::NotInitialized { .. } | ProviderError::AlreadyInitialized { .. }
        )
    }

    /// Check if this error comes from invalid provider configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ProviderError::UnknownProviderType { .. } | ProviderError::DuplicateProvider { .. }
        )
    }
}

impl From<ProviderError> for crate::Error {
    fn from(err: ProviderError) -> Self {
        crate::Error::Provider(err)
    }
}

/// Human-readable label for a provider, e.g. `local` or `local:ci`.
pub(crate) fn provider_label(provider_type: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("{provider_type}:{id}"),
        None => provider_type.to_string(),
    }
}
