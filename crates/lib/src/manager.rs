//!
//! Provides `AuthManager`, the entry point that wires providers, the identity
//! directory, the token manager and the persistence coordinator together.
//!
//! All components share one clock and one [`AuthConfig`]. Mutations stay in
//! memory until [`AuthManager::flush_all`] writes them out.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    Clock, Result, SystemClock,
    config::AuthConfig,
    credentials::CredentialError,
    identity::{IdentityDirectory, IdentityError, User, UserUpdate},
    persistence::PersistenceCoordinator,
    provider::{AuthProvider, Credentials, ProviderError, errors::provider_label, load_auth_providers},
    token::{RefreshToken, RefreshTokenOptions, TokenError, TokenManager},
};

/// Facade over the whole auth subsystem.
///
/// Every mutating method takes `&mut self`, so a single writer is enforced
/// by the borrow checker. Wrap the manager in a lock to share it between
/// tasks.
#[derive(Debug)]
pub struct AuthManager {
    config: AuthConfig,
    clock: Arc<dyn Clock>,
    providers: Vec<Box<dyn AuthProvider>>,
    directory: IdentityDirectory,
    tokens: TokenManager,
    coordinator: PersistenceCoordinator,
}

impl AuthManager {
    /// Load the auth state described by `config`, or start empty on first run.
    ///
    /// Providers are built but not initialized; see
    /// [`initialize_providers`](Self::initialize_providers).
    pub async fn open(config: AuthConfig) -> Result<Self> {
        Self::open_impl(config, Arc::new(SystemClock)).await
    }

    /// Same as [`AuthManager::open`] with an injected clock.
    ///
    /// Only available with the `testing` feature or in test builds.
    #[cfg(any(test, feature = "testing"))]
    pub async fn open_with_clock(config: AuthConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::open_impl(config, clock).await
    }

    async fn open_impl(config: AuthConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let settings = config.token_settings()?;
        let providers = load_auth_providers(&config.providers, &config.storage_dir)?;
        let coordinator = PersistenceCoordinator::new(&config.storage_dir);
        let (directory, tokens) = coordinator.load(clock.clone(), settings).await?;

        info!(
            storage_dir = %config.storage_dir.display(),
            providers = providers.len(),
            users = directory.users().count(),
            "Opened auth manager"
        );
        Ok(Self {
            config,
            clock,
            providers,
            directory,
            tokens,
            coordinator,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn coordinator(&self) -> &PersistenceCoordinator {
        &self.coordinator
    }

    /// Initialize every provider that is not initialized yet.
    pub async fn initialize_providers(&mut self) -> Result<()> {
        for provider in self.providers.iter_mut() {
            if !provider.is_initialized() {
                provider.initialize().await?;
            }
        }
        Ok(())
    }

    /// Configured providers, in priority order.
    pub fn auth_providers(&self) -> impl Iterator<Item = &dyn AuthProvider> {
        self.providers.iter().map(|p| p.as_ref())
    }

    /// Look up a provider by type and id.
    ///
    /// # Errors
    /// [`ProviderError::ProviderNotFound`] if no such provider is configured.
    pub fn auth_provider(&self, provider_type: &str, id: Option<&str>) -> Result<&dyn AuthProvider> {
        for provider in &self.providers {
            if provider.provider_type() == provider_type && provider.id() == id {
                return Ok(provider.as_ref());
            }
        }
        Err(provider_not_found(provider_type, id))
    }

    /// Mutable handle to a provider, for registering credentials.
    pub fn auth_provider_mut(
        &mut self,
        provider_type: &str,
        id: Option<&str>,
    ) -> Result<&mut dyn AuthProvider> {
        for provider in self.providers.iter_mut() {
            if provider.provider_type() == provider_type && provider.id() == id {
                return Ok(provider.as_mut());
            }
        }
        Err(provider_not_found(provider_type, id))
    }

    pub fn directory(&self) -> &IdentityDirectory {
        &self.directory
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn create_user<I, S>(&mut self, name: impl Into<String>, group_ids: I) -> Result<User>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directory.create_user(name, group_ids)
    }

    /// Update a user. Deactivating a user revokes all of their refresh tokens.
    pub fn update_user(&mut self, user_id: &str, update: UserUpdate) -> Result<User> {
        let deactivating = update.is_active == Some(false);
        let user = self.directory.update_user(user_id, update)?;
        if deactivating {
            self.tokens.revoke_all_for_user(user_id);
        }
        Ok(user)
    }

    pub fn link_credentials(&mut self, user_id: &str, credentials: Credentials) -> Result<()> {
        self.directory.link_credentials(user_id, credentials)
    }

    /// Validate a username/password against each initialized provider in
    /// order and return the linked, active user.
    ///
    /// # Errors
    /// - [`CredentialError::InvalidCredential`] if no provider accepts the pair
    /// - [`IdentityError::NoUserForCredentials`] if the credentials are not linked
    /// - [`IdentityError::UserInactive`] if the linked user is not active
    pub fn login(&self, username: &str, password: &str) -> Result<&User> {
        let mut credentials = None;
        for provider in self.providers.iter().filter(|p| p.is_initialized()) {
            match provider.validate(username, password) {
                Ok(creds) => {
                    credentials = Some(creds);
                    break;
                }
                Err(e) if e.is_invalid_credential() => {}
                Err(e) => return Err(e),
            }
        }
        let Some(credentials) = credentials else {
            debug!(username = %username, "Login rejected");
            return Err(CredentialError::InvalidCredential.into());
        };

        let user = self
            .directory
            .user_for_credentials(&credentials)
            .ok_or_else(|| IdentityError::NoUserForCredentials {
                username: credentials.username.clone(),
            })?;
        if !user.is_active() {
            return Err(IdentityError::UserInactive {
                user_id: user.id().to_string(),
            }
            .into());
        }
        info!(user_id = %user.id(), "User logged in");
        Ok(user)
    }

    /// Issue a refresh token for the user with id `user_id`.
    pub fn create_refresh_token(
        &mut self,
        user_id: &str,
        options: RefreshTokenOptions,
    ) -> Result<RefreshToken> {
        let user = self
            .directory
            .find_user(user_id)
            .ok_or_else(|| IdentityError::UserNotFound {
                user_id: user_id.to_string(),
            })?;
        self.tokens.create_refresh_token(user, options)
    }

    /// Derive an access token, refusing tokens of users that are no longer active.
    pub fn create_access_token(&self, refresh_token: &RefreshToken) -> Result<String> {
        self.active_owner(refresh_token)?;
        self.tokens.create_access_token(refresh_token)
    }

    /// Check an access token and return its user and parent refresh token.
    pub fn validate_access_token(&self, access_token: &str) -> Result<(&User, &RefreshToken)> {
        let refresh_token = self.tokens.verify_access_token(access_token)?;
        let user = self.active_owner(refresh_token)?;
        Ok((user, refresh_token))
    }

    pub fn revoke_refresh_token(&mut self, token_id: &str) -> Result<()> {
        self.tokens.revoke(token_id)
    }

    pub fn purge_expired_tokens(&mut self) -> usize {
        self.tokens.purge_expired()
    }

    /// Write all state to disk; see [`PersistenceCoordinator::flush_all`].
    pub async fn flush_all(&self) -> Result<()> {
        self.coordinator
            .flush_all(&self.providers, &self.directory, &self.tokens)
            .await
    }

    fn active_owner(&self, refresh_token: &RefreshToken) -> Result<&User> {
        match self.directory.find_user(refresh_token.user_id()) {
            Some(user) if user.is_active() => Ok(user),
            _ => {
                warn!(token_id = %refresh_token.id(), user_id = %refresh_token.user_id(), "Token owner is not active");
                Err(TokenError::UserInactive {
                    user_id: refresh_token.user_id().to_string(),
                }
                .into())
            }
        }
    }
}

fn provider_not_found(provider_type: &str, id: Option<&str>) -> crate::Error {
    ProviderError::ProviderNotFound {
        provider: provider_label(provider_type, id),
    }
    .into()
}
