//! Credential store
//!
//! Username/password-hash records for one auth provider, hashed with Argon2id
//! and persisted as a single atomically replaced document.

pub mod crypto;
pub mod errors;
pub mod store;

pub use errors::CredentialError;
pub use store::{CredentialRecord, CredentialSet, CredentialStore};
