//! Configuration for the auth subsystem
//!
//! [`AuthConfig`] is plain data: where documents are stored, which providers
//! exist, and the default token lifetimes. It deserializes from JSON with
//! every field optional.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    Result,
    constants::{
        DEFAULT_ACCESS_TOKEN_EXPIRATION_SECS, DEFAULT_REFRESH_TOKEN_EXPIRATION_SECS,
        DEFAULT_STORAGE_DIR, LOCAL_PROVIDER_TYPE,
    },
    token::TokenSettings,
};

/// Errors raised while reading or validating configuration.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::Config(err)
    }
}

/// One configured auth provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "type")]
    pub provider_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ProviderConfig {
    /// The built-in username/password provider.
    pub fn local() -> Self {
        Self {
            provider_type: LOCAL_PROVIDER_TYPE.to_string(),
            id: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Directory holding the persisted documents
    pub storage_dir: PathBuf,

    /// Providers in priority order
    pub providers: Vec<ProviderConfig>,

    /// Default access token lifetime for normal refresh tokens, in seconds
    pub access_token_expiration_secs: i64,

    /// Default lifetime of normal refresh tokens, in seconds
    pub refresh_token_expiration_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            providers: vec![ProviderConfig::local()],
            access_token_expiration_secs: DEFAULT_ACCESS_TOKEN_EXPIRATION_SECS,
            refresh_token_expiration_secs: DEFAULT_REFRESH_TOKEN_EXPIRATION_SECS,
        }
    }
}

impl AuthConfig {
    /// Default configuration storing documents directly in `storage_dir`.
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            ..Default::default()
        }
    }

    /// Default configuration storing documents in `<config_dir>/.storage`.
    pub fn for_config_dir(config_dir: impl AsRef<Path>) -> Self {
        Self::new(config_dir.as_ref().join(DEFAULT_STORAGE_DIR))
    }

    /// Read a JSON configuration file. Missing fields take their defaults.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.token_settings()?;
        Ok(config)
    }

    /// Token lifetimes as durations.
    ///
    /// # Errors
    /// [`ConfigError::InvalidValue`] for non-positive or out-of-range values.
    pub fn token_settings(&self) -> Result<TokenSettings> {
        Ok(TokenSettings {
            access_token_expiration: positive_secs(
                "access_token_expiration_secs",
                self.access_token_expiration_secs,
            )?,
            refresh_token_expiration: positive_secs(
                "refresh_token_expiration_secs",
                self.refresh_token_expiration_secs,
            )?,
        })
    }
}

fn positive_secs(field: &'static str, secs: i64) -> std::result::Result<Duration, ConfigError> {
    if secs <= 0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: format!("must be positive, got {secs}"),
        });
    }
    Duration::try_seconds(secs).ok_or_else(|| ConfigError::InvalidValue {
        field,
        reason: format!("{secs} is out of range"),
    })
}
