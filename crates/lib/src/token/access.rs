//! Signed access tokens
//!
//! An access token is never stored. It is the base64url (unpadded) encoding
//! of a small JSON claims object followed by `.` and the base64url encoding of
//! an Ed25519 signature over the encoded claims:
//!
//! ```text
//! eyJpc3MiOiI...In0.6Q0c...
//! ```
//!
//! The claims carry the id of the parent refresh token (`iss`), the issue
//! time (`iat`) and the expiry (`exp`), both in Unix seconds, so a token can
//! be checked with the signing key and a single refresh token lookup.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::errors::TokenError;
use crate::clock::from_unix_secs;

/// Size of the Ed25519 signing key in bytes
pub const SIGNING_KEY_SIZE: usize = 32;

/// Size of Ed25519 signatures in bytes
const SIGNATURE_SIZE: usize = 64;

/// Claims embedded in an access token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Id of the refresh token this access token was derived from
    pub iss: String,
    /// Issue time, Unix seconds
    pub iat: i64,
    /// Expiry, Unix seconds
    pub exp: i64,
}

impl AccessTokenClaims {
    pub fn refresh_token_id(&self) -> &str {
        &self.iss
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        from_unix_secs(self.iat)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        from_unix_secs(self.exp)
    }

    /// Expired once `now` reaches `exp` (inclusive).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Process-wide key that signs and verifies access tokens.
///
/// The secret is zeroed on drop.
pub struct TokenSigner {
    signing_key: SigningKey,
}

impl TokenSigner {
    /// Generate a fresh random signing key.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Restore a signer from its secret key bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TokenError> {
        let key: &[u8; SIGNING_KEY_SIZE] =
            bytes
                .try_into()
                .map_err(|_| TokenError::InvalidAccessToken {
                    reason: format!(
                        "signing key must be {SIGNING_KEY_SIZE} bytes, got {}",
                        bytes.len()
                    ),
                })?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(key),
        })
    }

    /// Secret key bytes, for persistence.
    pub(crate) fn to_bytes(&self) -> Zeroizing<[u8; SIGNING_KEY_SIZE]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Encode and sign `claims`.
    pub fn sign(&self, claims: &AccessTokenClaims) -> String {
        // Serializing three plain fields cannot fail
        let json = serde_json::to_vec(claims).unwrap_or_default();
        let payload = Base64UrlUnpadded::encode_string(&json);
        let signature = self.signing_key.sign(payload.as_bytes());
        format!(
            "{payload}.{}",
            Base64UrlUnpadded::encode_string(&signature.to_bytes())
        )
    }

    /// Check the signature of `token` and return its claims.
    ///
    /// Expiry is not checked here; see [`AccessTokenClaims::is_expired`].
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
        let invalid = |reason: &str| TokenError::InvalidAccessToken {
            reason: reason.to_string(),
        };

        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| invalid("expected 'claims.signature' format"))?;

        let signature_bytes =
            Base64UrlUnpadded::decode_vec(signature).map_err(|_| invalid("signature is not base64url"))?;
        let signature_array: [u8; SIGNATURE_SIZE] = signature_bytes
            .try_into()
            .map_err(|_| invalid("signature has the wrong length"))?;
        self.signing_key
            .verifying_key()
            .verify(payload.as_bytes(), &Signature::from_bytes(&signature_array))
            .map_err(|_| invalid("signature verification failed"))?;

        let json = Base64UrlUnpadded::decode_vec(payload).map_err(|_| invalid("claims are not base64url"))?;
        serde_json::from_slice(&json).map_err(|e| TokenError::InvalidAccessToken {
            reason: format!("malformed claims: {e}"),
        })
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("verifying_key", &Base64UrlUnpadded::encode_string(self.verifying_key().as_bytes()))
            .finish_non_exhaustive()
    }
}
