use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("stored password digest is malformed: {0}")]
    MalformedDigest(String),
    #[error("password verification failed: {0}")]
    Verify(String),
}

/// Well-formed digest with the default argon2 parameters that matches no
/// password. Verifying against it costs the same as a real check.
pub const DUMMY_DIGEST: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHRzYWx0$aGFzaGhhc2hoYXNoaGFzaGhhc2hoYXNoaGFzaGhhc2g";

fn peppered(plain: &str, pepper: &str) -> String {
    let mut input = String::with_capacity(plain.len() + pepper.len());
    input.push_str(plain);
    input.push_str(pepper);
    input
}

/// Argon2 digest of `plain‖pepper` with a fresh salt.
pub fn hash_password(plain: &str, pepper: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(peppered(plain, pepper).as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            PasswordError::Hashing(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(digest: &str, plain: &str, pepper: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(digest).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        PasswordError::MalformedDigest(e.to_string())
    })?;
    match Argon2::default().verify_password(peppered(plain, pepper).as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => {
            error!(error = %e, "argon2 verify_password error");
            Err(PasswordError::Verify(e.to_string()))
        }
    }
}
