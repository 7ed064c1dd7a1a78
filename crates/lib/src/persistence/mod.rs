//! Persistence coordinator
//!
//! Writes all mutated state to disk in a fixed order:
//!
//! 1. every initialized provider's credential document
//! 2. the auth document (users, refresh tokens, signing key)
//!
//! Each document is replaced atomically, so on restart every file reflects
//! a complete flush. The two stages are not one transaction: if stage 2
//! fails, stage 1 stays written and the error names the failed stage.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use zeroize::Zeroize;

pub mod errors;

pub use errors::{FlushStage, PersistenceError};

use crate::{
    Clock, Result,
    constants::AUTH_STORAGE_KEY,
    identity::{IdentityDirectory, User},
    provider::AuthProvider,
    storage::{
        StorageError, base64_bytes,
        document::{read_document, write_document},
    },
    token::{RefreshToken, TokenManager, TokenSettings, TokenSigner},
};

#[derive(Serialize)]
struct AuthDocumentRef<'a> {
    users: Vec<&'a User>,
    refresh_tokens: Vec<&'a RefreshToken>,
    #[serde(serialize_with = "base64_bytes::serialize")]
    signing_key: &'a [u8],
}

#[derive(Deserialize)]
struct AuthDocument {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    refresh_tokens: Vec<RefreshToken>,
    #[serde(with = "base64_bytes")]
    signing_key: Vec<u8>,
}

/// Orders and performs durable writes of all auth state.
#[derive(Clone, Debug)]
pub struct PersistenceCoordinator {
    storage_dir: PathBuf,
}

impl PersistenceCoordinator {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
        }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Path of the auth document.
    pub fn auth_path(&self) -> PathBuf {
        self.storage_dir.join(AUTH_STORAGE_KEY)
    }

    /// Fresh, empty identity and token state with a new signing key.
    pub fn initialize_empty(
        &self,
        clock: Arc<dyn Clock>,
        settings: TokenSettings,
    ) -> (IdentityDirectory, TokenManager) {
        (
            IdentityDirectory::initialize_empty(clock.clone()),
            TokenManager::initialize_empty(clock, settings),
        )
    }

    /// Load identity and token state, or start empty if nothing was saved.
    ///
    /// Refresh tokens whose user no longer exists are dropped.
    pub async fn load(
        &self,
        clock: Arc<dyn Clock>,
        settings: TokenSettings,
    ) -> Result<(IdentityDirectory, TokenManager)> {
        let path = self.auth_path();
        let Some(mut doc) = read_document::<AuthDocument>(&path, AUTH_STORAGE_KEY).await? else {
            info!(path = %path.display(), "No auth document found, starting empty");
            return Ok(self.initialize_empty(clock, settings));
        };

        let signer = TokenSigner::from_bytes(&doc.signing_key);
        doc.signing_key.zeroize();
        let signer = signer.map_err(|e| StorageError::InvalidValue {
            reason: e.to_string(),
        })?;

        let user_count = doc.users.len();
        let directory = IdentityDirectory::from_users(clock.clone(), doc.users)?;
        let mut tokens = TokenManager::from_parts(clock, settings, signer, doc.refresh_tokens);
        tokens.retain_tokens(|token| {
            let known = directory.find_user(token.user_id()).is_some();
            if !known {
                warn!(token_id = %token.id(), user_id = %token.user_id(), "Dropping refresh token of unknown user");
            }
            known
        });

        debug!(
            path = %path.display(),
            users = user_count,
            refresh_tokens = tokens.tokens().count(),
            "Loaded auth document"
        );
        Ok((directory, tokens))
    }

    /// Durably write all state: credentials first, then identity and tokens.
    ///
    /// Providers that were never initialized have nothing to write and are
    /// skipped.
    ///
    /// # Errors
    /// [`PersistenceError::FlushFailed`] naming the stage that failed. No
    /// retry or rollback is attempted.
    pub async fn flush_all(
        &self,
        providers: &[Box<dyn AuthProvider>],
        directory: &IdentityDirectory,
        tokens: &TokenManager,
    ) -> Result<()> {
        for provider in providers {
            if !provider.is_initialized() {
                debug!(provider = %provider.label(), "Skipping uninitialized provider");
                continue;
            }
            provider.save().await.map_err(|e| {
                warn!(provider = %provider.label(), error = %e, "Credential flush failed");
                PersistenceError::FlushFailed {
                    stage: FlushStage::Credentials,
                    source: Box::new(e),
                }
            })?;
        }

        self.save_auth(directory, tokens).await.map_err(|e| {
            warn!(error = %e, "Identity flush failed");
            PersistenceError::FlushFailed {
                stage: FlushStage::Identity,
                source: Box::new(e),
            }
        })?;

        info!(storage_dir = %self.storage_dir.display(), "Flushed auth state");
        Ok(())
    }

    async fn save_auth(&self, directory: &IdentityDirectory, tokens: &TokenManager) -> Result<()> {
        let key = tokens.signer().to_bytes();
        let doc = AuthDocumentRef {
            users: directory.users().collect(),
            refresh_tokens: tokens.tokens().collect(),
            signing_key: &key[..],
        };
        write_document(&self.auth_path(), AUTH_STORAGE_KEY, &doc).await?;
        Ok(())
    }
}
