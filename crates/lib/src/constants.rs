//! Constants used throughout the Keyward library.
//!
//! This module provides central definitions for storage keys, built-in group
//! identifiers and default token lifetimes.

/// Storage key of the document holding users, refresh tokens and the signing key.
pub const AUTH_STORAGE_KEY: &str = "auth";

/// Prefix of the storage key for a provider's credential document.
pub const PROVIDER_STORAGE_PREFIX: &str = "auth_provider";

/// Current version of every persisted document.
pub const STORAGE_VERSION: u32 = 1;

/// Provider type of the built-in username/password provider.
pub const LOCAL_PROVIDER_TYPE: &str = "local";

/// Group granting full administrative access.
pub const GROUP_ID_ADMIN: &str = "system-admin";

/// Group for regular users.
pub const GROUP_ID_USER: &str = "system-users";

/// Group for users with read-only access.
pub const GROUP_ID_READ_ONLY: &str = "system-read-only";

/// Default lifetime of access tokens derived from normal refresh tokens, in seconds.
pub const DEFAULT_ACCESS_TOKEN_EXPIRATION_SECS: i64 = 30 * 60;

/// Default lifetime of normal refresh tokens, in seconds.
pub const DEFAULT_REFRESH_TOKEN_EXPIRATION_SECS: i64 = 90 * 24 * 60 * 60;

/// Default directory, relative to the config directory, holding persisted documents.
pub const DEFAULT_STORAGE_DIR: &str = ".storage";
