use base64ct::{Base64Url, Encoding};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use thiserror::Error;
use tracing::error;

type HmacSha256 = Hmac<Sha256>;

/// Raw entropy of a remember token, before encoding.
pub const REMEMBER_TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("secure random source failed: {0}")]
    RandomSource(#[from] rand::Error),
    #[error("token is not valid url-safe base64")]
    Encoding,
    #[error("invalid hmac key")]
    InvalidKey,
}

/// Generates `n_bytes` from the OS random source, url-safe base64 encoded.
pub fn generate_token(n_bytes: usize) -> Result<String, TokenError> {
    let mut buf = vec![0u8; n_bytes];
    OsRng.try_fill_bytes(&mut buf).map_err(|e| {
        error!(error = %e, "os random source failed");
        TokenError::RandomSource(e)
    })?;
    Ok(Base64Url::encode_string(&buf))
}

pub fn remember_token() -> Result<String, TokenError> {
    generate_token(REMEMBER_TOKEN_BYTES)
}

/// Number of raw bytes encoded in `token`.
pub fn token_bytes(token: &str) -> Result<usize, TokenError> {
    Base64Url::decode_vec(token)
        .map(|raw| raw.len())
        .map_err(|_| TokenError::Encoding)
}

/// Keyed hash used to store remember tokens without keeping them in plaintext.
#[derive(Clone)]
pub struct TokenHasher {
    key: Vec<u8>,
}

impl TokenHasher {
    pub fn new(secret_key: &str) -> Self {
        Self {
            key: secret_key.as_bytes().to_vec(),
        }
    }

    pub fn hash(&self, input: &str) -> Result<String, TokenError> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| TokenError::InvalidKey)?;
        mac.update(input.as_bytes());
        Ok(Base64Url::encode_string(&mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for TokenHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenHasher").finish_non_exhaustive()
    }
}
