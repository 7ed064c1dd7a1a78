//! Token manager
//!
//! Refresh tokens bind a user to a client and are persisted; access tokens
//! are derived from them on demand, signed with a process-wide Ed25519 key,
//! and never stored.
//!
//! A refresh token is `Active` until it is revoked (stored, terminal) or its
//! `expires_at` is reached (computed, terminal).

pub mod access;
pub mod errors;
pub mod manager;
pub mod types;

pub use access::{AccessTokenClaims, TokenSigner};
pub use errors::TokenError;
pub use manager::{TokenManager, TokenSettings};
pub use types::{RefreshToken, RefreshTokenOptions, TokenState, TokenType};
