//! Pluggable authentication providers
//!
//! An [`AuthProvider`] validates a presented username/password against its own
//! credential store and exposes the primitives to register and modify
//! credentials. Providers are built from [`ProviderConfig`] entries by
//! [`load_auth_providers`].

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, config::ProviderConfig, constants::LOCAL_PROVIDER_TYPE};

pub mod errors;
pub mod local;

pub use errors::ProviderError;
pub use local::LocalAuthProvider;

use errors::provider_label;

/// Handle to a validated credential.
///
/// Identifies the provider that vouched for the login and the username it
/// knows. Users are linked to credentials through this handle; the password
/// hash never leaves the provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Credentials {
    pub provider_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    pub username: String,
}

impl Credentials {
    /// Whether these credentials were issued by the given provider.
    pub fn is_from(&self, provider: &dyn AuthProvider) -> bool {
        self.provider_type == provider.provider_type() && self.provider_id.as_deref() == provider.id()
    }
}

/// A credential mechanism backed by its own store.
///
/// [`initialize`](AuthProvider::initialize) must be called exactly once before
/// anything else; every other method fails with
/// [`ProviderError::NotInitialized`] until then.
#[async_trait]
pub trait AuthProvider: Send + Sync + std::fmt::Debug {
    /// Provider type name, e.g. `local`.
    fn provider_type(&self) -> &str;

    /// Optional id distinguishing several providers of the same type.
    fn id(&self) -> Option<&str>;

    fn is_initialized(&self) -> bool;

    /// Load the backing store, creating an empty one on first run.
    async fn initialize(&mut self) -> Result<()>;

    /// Check a username/password pair.
    ///
    /// # Errors
    /// [`CredentialError::InvalidCredential`](crate::credentials::CredentialError::InvalidCredential)
    /// for unknown usernames and wrong passwords alike.
    fn validate(&self, username: &str, password: &str) -> Result<Credentials>;

    /// Register a new username/password pair.
    fn add_credential(&mut self, username: &str, password: &str) -> Result<()>;

    fn remove_credential(&mut self, username: &str) -> Result<()>;

    fn change_password(&mut self, username: &str, new_password: &str) -> Result<()>;

    /// Persist the backing store.
    async fn save(&self) -> Result<()>;

    /// Credentials handle for `username` under this provider.
    fn credentials_for(&self, username: &str) -> Credentials {
        Credentials {
            provider_type: self.provider_type().to_string(),
            provider_id: self.id().map(str::to_string),
            username: username.to_string(),
        }
    }

    /// Label used in logs and errors.
    fn label(&self) -> String {
        provider_label(self.provider_type(), self.id())
    }
}

/// Build the configured providers, in configuration order.
///
/// Providers are returned uninitialized.
///
/// # Errors
/// [`ProviderError::UnknownProviderType`] for unsupported types and
/// [`ProviderError::DuplicateProvider`] when a `(type, id)` pair repeats.
pub fn load_auth_providers(
    configs: &[ProviderConfig],
    storage_dir: &Path,
) -> Result<Vec<Box<dyn AuthProvider>>> {
    let mut providers: Vec<Box<dyn AuthProvider>> = Vec::with_capacity(configs.len());

    for config in configs {
        let provider: Box<dyn AuthProvider> = match config.provider_type.as_str() {
            LOCAL_PROVIDER_TYPE => Box::new(LocalAuthProvider::new(config.id.clone(), storage_dir)),
            other => {
                return Err(ProviderError::UnknownProviderType {
                    provider_type: other.to_string(),
                }
                .into());
            }
        };

        if providers
            .iter()
            .any(|p| p.provider_type() == provider.provider_type() && p.id() == provider.id())
        {
            return Err(ProviderError::DuplicateProvider {
                provider: provider.label(),
            }
            .into());
        }
        providers.push(provider);
    }

    Ok(providers)
}
