//! Password hashing for credential records
//!
//! Passwords are hashed with Argon2id (default parameters) over a random
//! per-record salt. The raw hash bytes and the salt are stored separately in
//! the record. Comparison goes through [`argon2::password_hash::Output`],
//! whose equality is constant time.

use argon2::{Argon2, password_hash::Output};
use rand::{RngCore, rngs::OsRng};
use zeroize::Zeroizing;

use super::errors::CredentialError;

/// Salt length in bytes
pub const SALT_LENGTH: usize = 16;

/// Hash output length in bytes
pub const HASH_LENGTH: usize = 32;

/// Fixed salt used to burn the same amount of work for unknown usernames.
const DUMMY_SALT: [u8; SALT_LENGTH] = *b"keyward-nouser!!";

/// Generate a fresh random salt.
pub fn generate_salt() -> Vec<u8> {
    let mut salt = vec![0u8; SALT_LENGTH];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Hash a password with the given salt.
///
/// # Returns
/// The `HASH_LENGTH`-byte Argon2id output.
pub fn hash_password(password: impl AsRef<str>, salt: &[u8]) -> Result<Vec<u8>, CredentialError> {
    hash_password_with_len(password.as_ref(), salt, HASH_LENGTH).map(|hash| hash.to_vec())
}

fn hash_password_with_len(
    password: &str,
    salt: &[u8],
    len: usize,
) -> Result<Zeroizing<Vec<u8>>, CredentialError> {
    let mut out = Zeroizing::new(vec![0u8; len]);
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, &mut out)
        .map_err(|e| CredentialError::HashingFailed {
            reason: e.to_string(),
        })?;
    Ok(out)
}

/// Recompute the hash of `password` with `salt` and compare it to `expected`.
///
/// # Returns
/// `Ok(true)` on a match, `Ok(false)` otherwise. Errors only for malformed
/// stored values.
pub fn verify_password(
    password: impl AsRef<str>,
    salt: &[u8],
    expected: &[u8],
) -> Result<bool, CredentialError> {
    let expected = Output::new(expected).map_err(|e| CredentialError::HashingFailed {
        reason: format!("stored hash unusable: {e}"),
    })?;
    let computed = hash_password_with_len(password.as_ref(), salt, expected.len())?;
    let computed = Output::new(&computed).map_err(|e| CredentialError::HashingFailed {
        reason: e.to_string(),
    })?;
    Ok(computed == expected)
}

/// Spend one hash computation without comparing anything.
///
/// Called when a username is unknown so that failed lookups take as long as
/// failed password checks.
pub(crate) fn burn_password_check(password: impl AsRef<str>) {
    let _ = hash_password_with_len(password.as_ref(), &DUMMY_SALT, HASH_LENGTH);
}
