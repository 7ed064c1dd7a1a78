//! Refresh token records and creation options

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a refresh token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Interactive session token; lifetimes default from configuration.
    Normal,
    /// Token for non-interactive clients. Must be created with an explicit
    /// access token lifetime.
    LongLivedAccessToken,
}

/// Lifecycle state of a refresh token at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenState {
    Active,
    /// Terminal, stored.
    Revoked,
    /// Terminal, computed from `expires_at`.
    Expired,
}

/// A persisted refresh token.
///
/// Immutable once created, except for revocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub(super) id: String,

    /// Secret value presented by clients, hex encoded
    pub(super) token: String,

    pub(super) user_id: String,

    pub(super) client_name: String,

    pub(super) token_type: TokenType,

    pub(super) created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) expires_at: Option<DateTime<Utc>>,

    /// Lifetime of access tokens derived from this token, in seconds
    pub(super) access_token_expiration: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The secret clients present to use this refresh token.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn access_token_expiration(&self) -> Duration {
        Duration::try_seconds(self.access_token_expiration).unwrap_or_else(Duration::zero)
    }

    pub fn revoked_at(&self) -> Option<DateTime<Utc>> {
        self.revoked_at
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Expired once `now` reaches `expires_at` (inclusive).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    pub fn state(&self, now: DateTime<Utc>) -> TokenState {
        if self.is_revoked() {
            TokenState::Revoked
        } else if self.is_expired(now) {
            TokenState::Expired
        } else {
            TokenState::Active
        }
    }
}

/// Options for [`TokenManager::create_refresh_token`](super::TokenManager::create_refresh_token).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshTokenOptions {
    pub token_type: TokenType,
    pub client_name: String,
    /// Lifetime of derived access tokens. Required for long-lived tokens;
    /// normal tokens fall back to the configured default.
    pub access_token_expiration: Option<Duration>,
    /// Lifetime of the refresh token itself. Normal tokens fall back to the
    /// configured default; long-lived tokens never expire unless set.
    pub expires_in: Option<Duration>,
}

impl RefreshTokenOptions {
    pub fn normal(client_name: impl Into<String>) -> Self {
        Self {
            token_type: TokenType::Normal,
            client_name: client_name.into(),
            access_token_expiration: None,
            expires_in: None,
        }
    }

    pub fn long_lived(client_name: impl Into<String>, access_token_expiration: Duration) -> Self {
        Self {
            token_type: TokenType::LongLivedAccessToken,
            client_name: client_name.into(),
            access_token_expiration: Some(access_token_expiration),
            expires_in: None,
        }
    }

    pub fn with_access_token_expiration(mut self, expiration: Duration) -> Self {
        self.access_token_expiration = Some(expiration);
        self
    }

    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }
}
