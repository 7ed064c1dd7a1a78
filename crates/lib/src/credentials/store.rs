//! Durable username/password-hash records for one auth provider

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{crypto, errors::CredentialError};
use crate::{
    Result,
    storage::{
        base64_bytes,
        document::{read_document, write_document},
    },
};

/// A stored credential.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Unique, case-sensitive login name
    pub username: String,

    /// Argon2id output
    #[serde(with = "base64_bytes")]
    pub password_hash: Vec<u8>,

    /// Per-record random salt
    #[serde(with = "base64_bytes")]
    pub salt: Vec<u8>,
}

impl CredentialRecord {
    /// Build a record for `username`, hashing `password` with a fresh salt.
    fn new(username: String, password: &str) -> std::result::Result<Self, CredentialError> {
        let salt = crypto::generate_salt();
        let password_hash = crypto::hash_password(password, &salt)?;
        Ok(Self {
            username,
            password_hash,
            salt,
        })
    }
}

/// A full snapshot of a credential store, keyed by username.
///
/// Serialized as a list ordered by username, so saving an unchanged set
/// always produces the same bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "CredentialDocument", try_from = "CredentialDocument")]
pub struct CredentialSet {
    records: BTreeMap<String, CredentialRecord>,
}

#[derive(Serialize, Deserialize)]
struct CredentialDocument {
    #[serde(default)]
    credentials: Vec<CredentialRecord>,
}

impl From<CredentialSet> for CredentialDocument {
    fn from(set: CredentialSet) -> Self {
        Self {
            credentials: set.records.into_values().collect(),
        }
    }
}

impl TryFrom<CredentialDocument> for CredentialSet {
    type Error = String;

    fn try_from(doc: CredentialDocument) -> std::result::Result<Self, Self::Error> {
        let mut records = BTreeMap::new();
        for record in doc.credentials {
            if records.contains_key(&record.username) {
                return Err(format!("duplicate username '{}'", record.username));
            }
            records.insert(record.username.clone(), record);
        }
        Ok(Self { records })
    }
}

impl CredentialSet {
    /// Look up a record by username.
    pub fn get(&self, username: &str) -> Option<&CredentialRecord> {
        self.records.get(username)
    }

    /// Iterate over records in username order.
    pub fn iter(&self) -> impl Iterator<Item = &CredentialRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Credential store backed by one document on disk.
///
/// All mutations are in memory until [`save`](Self::save) writes the whole
/// snapshot. A failed mutation never changes the in-memory set.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    key: String,
    set: CredentialSet,
}

impl CredentialStore {
    /// Create an empty store that will be saved under `dir/key`.
    pub fn initialize_empty(dir: impl AsRef<Path>, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            path: dir.as_ref().join(&key),
            key,
            set: CredentialSet::default(),
        }
    }

    /// Load the store saved under `dir/key`, or an empty one if none exists yet.
    pub async fn load(dir: impl AsRef<Path>, key: impl Into<String>) -> Result<Self> {
        let mut store = Self::initialize_empty(dir, key);
        match read_document::<CredentialSet>(&store.path, &store.key).await? {
            Some(set) => {
                debug!(path = %store.path.display(), count = set.len(), "Loaded credential store");
                store.set = set;
            }
            None => {
                info!(path = %store.path.display(), "No credential store found, starting empty");
            }
        }
        Ok(store)
    }

    /// Write the full snapshot atomically, replacing the previous file.
    pub async fn save(&self) -> Result<()> {
        write_document(&self.path, &self.key, &self.set).await?;
        debug!(path = %self.path.display(), count = self.set.len(), "Saved credential store");
        Ok(())
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Storage key of the backing document.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The current in-memory snapshot.
    pub fn snapshot(&self) -> &CredentialSet {
        &self.set
    }

    pub fn contains(&self, username: &str) -> bool {
        self.set.records.contains_key(username)
    }

    /// Usernames in sorted order.
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.set.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Register a new credential.
    ///
    /// # Errors
    /// [`CredentialError::EmptyUsername`] for blank usernames,
    /// [`CredentialError::DuplicateUsername`] if the username is taken.
    pub fn add_credential(&mut self, username: impl Into<String>, password: &str) -> Result<()> {
        let username = username.into();
        Self::check_username(&username)?;
        if self.contains(&username) {
            return Err(CredentialError::DuplicateUsername { username }.into());
        }

        let record = CredentialRecord::new(username.clone(), password)?;
        self.set.records.insert(username.clone(), record);
        debug!(username = %username, "Added credential");
        Ok(())
    }

    /// Check `password` against the stored hash for `username`.
    ///
    /// # Returns
    /// `Ok(true)` on a match and `Ok(false)` on a mismatch.
    ///
    /// # Errors
    /// [`CredentialError::NotFound`] if no record exists for `username`.
    pub fn verify_credential(&self, username: &str, password: &str) -> Result<bool> {
        let record = self.record(username)?;
        let matches = crypto::verify_password(password, &record.salt, &record.password_hash)
            .map_err(|e| CredentialError::InvalidRecord {
                username: username.to_string(),
                reason: e.to_string(),
            })?;
        Ok(matches)
    }

    /// Remove the credential for `username`.
    pub fn remove_credential(&mut self, username: &str) -> Result<()> {
        self.record(username)?;
        self.set.records.remove(username);
        debug!(username = %username, "Removed credential");
        Ok(())
    }

    /// Replace the password of an existing credential, with a fresh salt.
    pub fn change_password(&mut self, username: &str, new_password: &str) -> Result<()> {
        self.record(username)?;
        let record = CredentialRecord::new(username.to_string(), new_password)?;
        self.set.records.insert(username.to_string(), record);
        debug!(username = %username, "Changed password");
        Ok(())
    }

    fn record(&self, username: &str) -> std::result::Result<&CredentialRecord, CredentialError> {
        self.set
            .get(username)
            .ok_or_else(|| CredentialError::NotFound {
                username: username.to_string(),
            })
    }

    fn check_username(username: &str) -> std::result::Result<(), CredentialError> {
        if username.trim().is_empty() {
            return Err(CredentialError::EmptyUsername);
        }
        Ok(())
    }
}
