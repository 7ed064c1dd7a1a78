//! Persisted document storage
//!
//! Low-level helpers shared by the credential store and the persistence
//! coordinator: the versioned document envelope, atomic file replacement and
//! encodings for binary fields.

pub(crate) mod document;
pub mod errors;

pub use errors::StorageError;

/// Serde adapter storing byte vectors as standard base64 strings.
pub(crate) mod base64_bytes {
    use base64ct::{Base64, Encoding};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<B, S>(bytes: &B, serializer: S) -> Result<S::Ok, S::Error>
    where
        B: AsRef<[u8]> + ?Sized,
        S: Serializer,
    {
        serializer.serialize_str(&Base64::encode_string(bytes.as_ref()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Base64::decode_vec(&encoded).map_err(serde::de::Error::custom)
    }
}
