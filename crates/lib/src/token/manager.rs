//! Refresh token issuance, access token derivation and revocation

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rand::{RngCore, rngs::OsRng};
use subtle::ConstantTimeEq;
use tracing::{debug, info};

use super::{
    access::{AccessTokenClaims, TokenSigner},
    errors::TokenError,
    types::{RefreshToken, RefreshTokenOptions, TokenState, TokenType},
};
use crate::{
    Clock, Result,
    constants::{DEFAULT_ACCESS_TOKEN_EXPIRATION_SECS, DEFAULT_REFRESH_TOKEN_EXPIRATION_SECS},
    identity::User,
};

/// Length of the random refresh token secret, in bytes
const TOKEN_SECRET_BYTES: usize = 64;

/// Default lifetimes applied to normal refresh tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenSettings {
    pub access_token_expiration: Duration,
    pub refresh_token_expiration: Duration,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            access_token_expiration: Duration::seconds(DEFAULT_ACCESS_TOKEN_EXPIRATION_SECS),
            refresh_token_expiration: Duration::seconds(DEFAULT_REFRESH_TOKEN_EXPIRATION_SECS),
        }
    }
}

/// Owner of all refresh tokens and of the access token signing key.
///
/// Access tokens are checked with a signature check plus one lookup in the
/// in-memory token map; revoked tokens stay in the map so the lookup doubles
/// as the revocation list.
#[derive(Debug)]
pub struct TokenManager {
    clock: Arc<dyn Clock>,
    settings: TokenSettings,
    signer: TokenSigner,
    tokens: BTreeMap<String, RefreshToken>,
}

impl TokenManager {
    /// Create a manager with no tokens and a freshly generated signing key.
    pub fn initialize_empty(clock: Arc<dyn Clock>, settings: TokenSettings) -> Self {
        Self::from_parts(clock, settings, TokenSigner::generate(), Vec::new())
    }

    pub(crate) fn from_parts(
        clock: Arc<dyn Clock>,
        settings: TokenSettings,
        signer: TokenSigner,
        tokens: Vec<RefreshToken>,
    ) -> Self {
        Self {
            clock,
            settings,
            signer,
            tokens: tokens.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }

    pub(crate) fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Issue a new refresh token for `user`.
    ///
    /// # Errors
    /// - [`TokenError::UserInactive`] if the user is not active
    /// - [`TokenError::MissingAccessTokenExpiration`] for long-lived tokens without an explicit access token lifetime
    /// - [`TokenError::MissingClientName`] for long-lived tokens without a client name
    /// - [`TokenError::DuplicateClientName`] if the user already holds a live long-lived token for the client
    /// - [`TokenError::InvalidExpiration`] for non-positive or out-of-range lifetimes,
    ///   or an access token lifetime that is not a whole number of seconds
    ///
    /// `created_at` is truncated to whole seconds, the resolution of access
    /// token claims.
    pub fn create_refresh_token(
        &mut self,
        user: &User,
        options: RefreshTokenOptions,
    ) -> Result<RefreshToken> {
        if !user.is_active() {
            return Err(TokenError::UserInactive {
                user_id: user.id().to_string(),
            }
            .into());
        }

        let now = self.clock.now().trunc_subsecs(0);
        let (access_token_expiration, expires_in) = match options.token_type {
            TokenType::LongLivedAccessToken => {
                if options.client_name.trim().is_empty() {
                    return Err(TokenError::MissingClientName.into());
                }
                let expiration = options
                    .access_token_expiration
                    .ok_or(TokenError::MissingAccessTokenExpiration)?;
                if self.has_live_long_lived_token(user.id(), &options.client_name, now) {
                    return Err(TokenError::DuplicateClientName {
                        client_name: options.client_name,
                    }
                    .into());
                }
                (expiration, options.expires_in)
            }
            TokenType::Normal => (
                options
                    .access_token_expiration
                    .unwrap_or(self.settings.access_token_expiration),
                Some(
                    options
                        .expires_in
                        .unwrap_or(self.settings.refresh_token_expiration),
                ),
            ),
        };

        check_positive("access token expiration", access_token_expiration)?;
        check_whole_seconds("access token expiration", access_token_expiration)?;
        let expires_at = match expires_in {
            Some(expires_in) => {
                check_positive("refresh token expiration", expires_in)?;
                Some(now.checked_add_signed(expires_in).ok_or_else(|| {
                    TokenError::InvalidExpiration {
                        reason: "refresh token expiration out of range".to_string(),
                    }
                })?)
            }
            None => None,
        };

        let id = loop {
            let candidate = uuid::Uuid::new_v4().simple().to_string();
            if !self.tokens.contains_key(&candidate) {
                break candidate;
            }
        };
        let mut secret = [0u8; TOKEN_SECRET_BYTES];
        OsRng.fill_bytes(&mut secret);

        let token = RefreshToken {
            id: id.clone(),
            token: hex::encode(secret),
            user_id: user.id().to_string(),
            client_name: options.client_name,
            token_type: options.token_type,
            created_at: now,
            expires_at,
            access_token_expiration: access_token_expiration.num_seconds(),
            revoked_at: None,
        };
        info!(
            token_id = %id,
            user_id = %token.user_id,
            client_name = %token.client_name,
            token_type = ?token.token_type,
            "Created refresh token"
        );
        self.tokens.insert(id, token.clone());
        Ok(token)
    }

    /// Derive a signed access token from a live refresh token.
    ///
    /// The access token expires `access_token_expiration` after now.
    ///
    /// # Errors
    /// [`TokenError::Revoked`], [`TokenError::Expired`], or
    /// [`TokenError::NotFound`] if the token is not managed here.
    pub fn create_access_token(&self, refresh_token: &RefreshToken) -> Result<String> {
        let stored = self.lookup(refresh_token.id())?;
        let now = self.clock.now();
        check_live(stored, now)?;

        let iat = now.trunc_subsecs(0).timestamp();
        let claims = AccessTokenClaims {
            iss: stored.id.clone(),
            iat,
            exp: iat.saturating_add(stored.access_token_expiration),
        };
        debug!(token_id = %stored.id, exp = claims.exp, "Created access token");
        Ok(self.signer.sign(&claims))
    }

    /// Check an access token and return the refresh token it was derived from.
    ///
    /// Only the signature, the embedded expiry and the parent token's state
    /// are checked; whether the user is still active is up to the caller.
    pub fn verify_access_token(&self, access_token: &str) -> Result<&RefreshToken> {
        let claims = self.signer.verify(access_token)?;
        let now = self.clock.now();
        if claims.is_expired(now) {
            return Err(TokenError::Expired {
                token_id: claims.iss,
            }
            .into());
        }
        let stored = self.lookup(&claims.iss)?;
        check_live(stored, now)?;
        Ok(stored)
    }

    /// Decode an access token after checking its signature. Expiry and the
    /// parent token's state are not checked.
    pub fn access_token_claims(&self, access_token: &str) -> Result<AccessTokenClaims> {
        Ok(self.signer.verify(access_token)?)
    }

    /// Revoke a refresh token. Revoking an already revoked token does nothing.
    ///
    /// # Errors
    /// [`TokenError::NotFound`] if the token is unknown.
    pub fn revoke(&mut self, token_id: &str) -> Result<()> {
        let now = self.clock.now();
        let token = self
            .tokens
            .get_mut(token_id)
            .ok_or_else(|| TokenError::NotFound {
                token_id: token_id.to_string(),
            })?;
        if token.revoked_at.is_none() {
            token.revoked_at = Some(now);
            info!(token_id = %token_id, "Revoked refresh token");
        }
        Ok(())
    }

    /// Revoke every live refresh token of a user, returning how many changed.
    pub fn revoke_all_for_user(&mut self, user_id: &str) -> usize {
        let now = self.clock.now();
        let mut revoked = 0;
        for token in self.tokens.values_mut() {
            if token.user_id == user_id && token.revoked_at.is_none() {
                token.revoked_at = Some(now);
                revoked += 1;
            }
        }
        if revoked > 0 {
            info!(user_id = %user_id, count = revoked, "Revoked refresh tokens for user");
        }
        revoked
    }

    pub fn find_token(&self, token_id: &str) -> Option<&RefreshToken> {
        self.tokens.get(token_id)
    }

    /// Find a refresh token by its secret value.
    pub fn find_by_token(&self, secret: &str) -> Option<&RefreshToken> {
        let mut found = None;
        for token in self.tokens.values() {
            // Visit every token so timing does not depend on the match position
            if bool::from(token.token.as_bytes().ct_eq(secret.as_bytes())) {
                found = Some(token);
            }
        }
        found
    }

    /// All refresh tokens, ordered by id.
    pub fn tokens(&self) -> impl Iterator<Item = &RefreshToken> {
        self.tokens.values()
    }

    pub fn tokens_for_user<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a RefreshToken> {
        self.tokens.values().filter(move |t| t.user_id == user_id)
    }

    /// Drop refresh tokens whose `expires_at` has passed, returning how many.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.tokens.len();
        self.tokens.retain(|_, token| !token.is_expired(now));
        let purged = before - self.tokens.len();
        if purged > 0 {
            info!(count = purged, "Purged expired refresh tokens");
        }
        purged
    }

    /// Keep only tokens accepted by `keep`; used when restoring state.
    pub(crate) fn retain_tokens(&mut self, mut keep: impl FnMut(&RefreshToken) -> bool) {
        self.tokens.retain(|_, token| keep(token));
    }

    fn lookup(&self, token_id: &str) -> std::result::Result<&RefreshToken, TokenError> {
        self.tokens.get(token_id).ok_or_else(|| TokenError::NotFound {
            token_id: token_id.to_string(),
        })
    }

    fn has_live_long_lived_token(&self, user_id: &str, client_name: &str, now: DateTime<Utc>) -> bool {
        self.tokens.values().any(|t| {
            t.user_id == user_id
                && t.token_type == TokenType::LongLivedAccessToken
                && t.client_name == client_name
                && t.state(now) == TokenState::Active
        })
    }
}

fn check_live(token: &RefreshToken, now: DateTime<Utc>) -> std::result::Result<(), TokenError> {
    match token.state(now) {
        TokenState::Active => Ok(()),
        TokenState::Revoked => Err(TokenError::Revoked {
            token_id: token.id.clone(),
        }),
        TokenState::Expired => Err(TokenError::Expired {
            token_id: token.id.clone(),
        }),
    }
}

fn check_positive(what: &str, duration: Duration) -> std::result::Result<(), TokenError> {
    if duration <= Duration::zero() {
        return Err(TokenError::InvalidExpiration {
            reason: format!("{what} must be positive"),
        });
    }
    Ok(())
}

// Stored lifetimes and access token claims are whole seconds
fn check_whole_seconds(what: &str, duration: Duration) -> std::result::Result<(), TokenError> {
    if duration != Duration::seconds(duration.num_seconds()) {
        return Err(TokenError::InvalidExpiration {
            reason: format!("{what} must be a whole number of seconds"),
        });
    }
    Ok(())
}
