use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::{error::UserError, model::User, repo::UserDb};
use crate::auth::{
    password,
    token::{self, TokenHasher, REMEMBER_TOKEN_BYTES},
};

pub const MIN_PASSWORD_LEN: usize = 8;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,16}$").expect("email regex compiles");
}

type UserCheck<'a> = &'a (dyn Fn(&mut User) -> Result<(), UserError> + Sync);

/// Applies `checks` to `record` in order and stops at the first failure.
/// Checks may rewrite the record, so later checks see earlier changes.
pub fn run_validators<T, E>(
    record: &mut T,
    checks: &[&(dyn Fn(&mut T) -> Result<(), E> + Sync)],
) -> Result<(), E> {
    for check in checks {
        check(record)?;
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn password_required(user: &mut User) -> Result<(), UserError> {
    if user.password.is_empty() {
        return Err(UserError::PasswordRequired);
    }
    Ok(())
}

fn password_min_length(user: &mut User) -> Result<(), UserError> {
    if user.password.is_empty() {
        return Ok(());
    }
    if user.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::PasswordTooShort);
    }
    Ok(())
}

fn password_hash_required(user: &mut User) -> Result<(), UserError> {
    if user.password_hash.is_empty() {
        return Err(UserError::PasswordRequired);
    }
    Ok(())
}

fn remember_default(user: &mut User) -> Result<(), UserError> {
    if user.remember.is_empty() {
        user.remember = token::remember_token().map_err(UserError::RandomSource)?;
    }
    Ok(())
}

fn remember_min_bytes(user: &mut User) -> Result<(), UserError> {
    if user.remember.is_empty() {
        return Ok(());
    }
    match token::token_bytes(&user.remember) {
        Ok(n) if n >= REMEMBER_TOKEN_BYTES => Ok(()),
        _ => Err(UserError::RememberTooShort),
    }
}

fn remember_hash_required(user: &mut User) -> Result<(), UserError> {
    if user.remember_hash.is_empty() {
        return Err(UserError::RememberRequired);
    }
    Ok(())
}

fn email_normalize(user: &mut User) -> Result<(), UserError> {
    user.email = normalize_email(&user.email);
    Ok(())
}

fn email_required(user: &mut User) -> Result<(), UserError> {
    if user.email.is_empty() {
        return Err(UserError::EmailRequired);
    }
    Ok(())
}

fn email_format(user: &mut User) -> Result<(), UserError> {
    if !EMAIL_RE.is_match(&user.email) {
        return Err(UserError::EmailInvalid);
    }
    Ok(())
}

/// Validation layer in front of a `UserDb`.
#[derive(Clone)]
pub struct UserValidator {
    db: Arc<dyn UserDb>,
    hasher: TokenHasher,
    pepper: String,
}

impl UserValidator {
    pub fn new(db: Arc<dyn UserDb>, hasher: TokenHasher, pepper: impl Into<String>) -> Self {
        Self {
            db,
            hasher,
            pepper: pepper.into(),
        }
    }

    pub fn pepper(&self) -> &str {
        &self.pepper
    }

    /// Looks a user up by the plaintext token from their cookie.
    pub async fn by_remember_token(&self, token: &str) -> Result<User, UserError> {
        let hash = self
            .hasher
            .hash(token)
            .map_err(|e| UserError::RememberHashing(e.to_string()))?;
        self.db.by_remember_hash(&hash).await
    }

    fn hash_password(&self, user: &mut User) -> Result<(), UserError> {
        if user.password.is_empty() {
            return Ok(());
        }
        user.password_hash = password::hash_password(&user.password, &self.pepper)?;
        user.password.clear();
        Ok(())
    }

    fn hash_remember(&self, user: &mut User) -> Result<(), UserError> {
        if user.remember.is_empty() {
            return Ok(());
        }
        user.remember_hash = self
            .hasher
            .hash(&user.remember)
            .map_err(|e| UserError::RememberHashing(e.to_string()))?;
        Ok(())
    }

    /// Storage enforces this too; the lookup just lets most conflicts
    /// surface as `EmailTaken` instead of a constraint error.
    async fn email_available(&self, user: &User) -> Result<(), UserError> {
        match self.db.by_email(&user.email).await {
            Ok(existing) if existing.id != user.id => Err(UserError::EmailTaken),
            Ok(_) | Err(UserError::NotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl UserDb for UserValidator {
    async fn by_id(&self, id: i64) -> Result<User, UserError> {
        self.db.by_id(id).await
    }

    async fn by_email(&self, email: &str) -> Result<User, UserError> {
        self.db.by_email(&normalize_email(email)).await
    }

    async fn by_remember_hash(&self, hash: &str) -> Result<User, UserError> {
        self.db.by_remember_hash(hash).await
    }

    async fn create(&self, user: &mut User) -> Result<(), UserError> {
        let hash_password = |u: &mut User| self.hash_password(u);
        let hash_remember = |u: &mut User| self.hash_remember(u);
        let checks: &[UserCheck<'_>] = &[
            &password_required,
            &password_min_length,
            &hash_password,
            &password_hash_required,
            &remember_default,
            &remember_min_bytes,
            &hash_remember,
            &remember_hash_required,
            &email_normalize,
            &email_required,
            &email_format,
        ];
        if let Err(e) = run_validators(user, checks) {
            debug!(error = %e, "create rejected");
            return Err(e);
        }
        self.email_available(user).await?;
        self.db.create(user).await
    }

    async fn update(&self, user: &mut User) -> Result<(), UserError> {
        let hash_password = |u: &mut User| self.hash_password(u);
        let hash_remember = |u: &mut User| self.hash_remember(u);
        let checks: &[UserCheck<'_>] = &[
            &password_min_length,
            &hash_password,
            &password_hash_required,
            &remember_min_bytes,
            &hash_remember,
            &remember_hash_required,
            &email_normalize,
            &email_required,
            &email_format,
        ];
        if let Err(e) = run_validators(user, checks) {
            debug!(user_id = user.id, error = %e, "update rejected");
            return Err(e);
        }
        self.email_available(user).await?;
        self.db.update(user).await
    }

    async fn delete(&self, id: i64) -> Result<(), UserError> {
        if id <= 0 {
            return Err(UserError::InvalidId);
        }
        self.db.delete(id).await
    }
}
