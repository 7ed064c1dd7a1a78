//! Username/password provider backed by a local credential store

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};

use super::{AuthProvider, Credentials, errors::ProviderError};
use crate::{
    Result,
    constants::{LOCAL_PROVIDER_TYPE, PROVIDER_STORAGE_PREFIX},
    credentials::{CredentialError, CredentialStore, crypto},
};

/// The built-in `local` provider.
///
/// Credentials live in `<storage_dir>/auth_provider.local`, or
/// `auth_provider.local.<id>` when the provider has an id.
#[derive(Debug)]
pub struct LocalAuthProvider {
    id: Option<String>,
    storage_dir: PathBuf,
    store: Option<CredentialStore>,
}

impl LocalAuthProvider {
    pub fn new(id: Option<String>, storage_dir: impl AsRef<Path>) -> Self {
        Self {
            id,
            storage_dir: storage_dir.as_ref().to_path_buf(),
            store: None,
        }
    }

    /// Storage key of this provider's credential document.
    pub fn storage_key(&self) -> String {
        match &self.id {
            Some(id) => format!("{PROVIDER_STORAGE_PREFIX}.{LOCAL_PROVIDER_TYPE}.{id}"),
            None => format!("{PROVIDER_STORAGE_PREFIX}.{LOCAL_PROVIDER_TYPE}"),
        }
    }

    /// The underlying credential store.
    pub fn store(&self) -> Result<&CredentialStore> {
        self.store.as_ref().ok_or_else(|| self.not_initialized())
    }

    fn store_mut(&mut self) -> Result<&mut CredentialStore> {
        let provider = self.label();
        self.store
            .as_mut()
            .ok_or_else(|| ProviderError::NotInitialized { provider }.into())
    }

    fn not_initialized(&self) -> crate::Error {
        ProviderError::NotInitialized {
            provider: self.label(),
        }
        .into()
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    fn provider_type(&self) -> &str {
        LOCAL_PROVIDER_TYPE
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn is_initialized(&self) -> bool {
        self.store.is_some()
    }

    async fn initialize(&mut self) -> Result<()> {
        if self.store.is_some() {
            return Err(ProviderError::AlreadyInitialized {
                provider: self.label(),
            }
            .into());
        }
        let store = CredentialStore::load(&self.storage_dir, self.storage_key()).await?;
        info!(provider = %self.label(), credentials = store.len(), "Initialized auth provider");
        self.store = Some(store);
        Ok(())
    }

    fn validate(&self, username: &str, password: &str) -> Result<Credentials> {
        let store = self.store()?;
        match store.verify_credential(username, password) {
            Ok(true) => Ok(self.credentials_for(username)),
            Ok(false) => Err(CredentialError::InvalidCredential.into()),
            Err(crate::Error::Credential(CredentialError::NotFound { .. })) => {
                crypto::burn_password_check(password);
                Err(CredentialError::InvalidCredential.into())
            }
            Err(e) => {
                warn!(provider = %self.label(), username = %username, error = %e, "Credential check failed");
                Err(e)
            }
        }
    }

    fn add_credential(&mut self, username: &str, password: &str) -> Result<()> {
        self.store_mut()?.add_credential(username, password)
    }

    fn remove_credential(&mut self, username: &str) -> Result<()> {
        self.store_mut()?.remove_credential(username)
    }

    fn change_password(&mut self, username: &str, new_password: &str) -> Result<()> {
        self.store_mut()?.change_password(username, new_password)
    }

    async fn save(&self) -> Result<()> {
        self.store()?.save().await
    }
}
