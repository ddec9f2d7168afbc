use tracing::{info, instrument, warn};

use super::{error::UserError, model::User, repo::UserDb, validation::UserValidator};
use crate::auth::{password, token};

/// Entry point the HTTP layer talks to.
#[derive(Clone)]
pub struct UserService {
    inner: UserValidator,
}

impl UserService {
    pub fn new(inner: UserValidator) -> Self {
        Self { inner }
    }

    pub async fn by_id(&self, id: i64) -> Result<User, UserError> {
        self.inner.by_id(id).await
    }

    pub async fn by_email(&self, email: &str) -> Result<User, UserError> {
        self.inner.by_email(email).await
    }

    pub async fn by_remember_token(&self, token: &str) -> Result<User, UserError> {
        self.inner.by_remember_token(token).await
    }

    #[instrument(skip_all)]
    pub async fn create(&self, user: &mut User) -> Result<(), UserError> {
        self.inner.create(user).await?;
        info!(user_id = user.id, "user created");
        Ok(())
    }

    #[instrument(skip_all, fields(user_id = user.id))]
    pub async fn update(&self, user: &mut User) -> Result<(), UserError> {
        self.inner.update(user).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), UserError> {
        self.inner.delete(id).await?;
        info!(user_id = id, "user deleted");
        Ok(())
    }

    /// Checks an email/password pair. An unknown email comes back as
    /// `NotFound`; callers showing a message should treat it like
    /// `InvalidCredentials`.
    #[instrument(skip(self, plain))]
    pub async fn authenticate(&self, email: &str, plain: &str) -> Result<User, UserError> {
        let mut user = match self.inner.by_email(email).await {
            Ok(u) => u,
            Err(UserError::NotFound) => {
                // Unknown emails take as long to reject as wrong passwords.
                let _ =
                    password::verify_password(password::DUMMY_DIGEST, plain, self.inner.pepper());
                return Err(UserError::NotFound);
            }
            Err(e) => return Err(e),
        };
        if !password::verify_password(&user.password_hash, plain, self.inner.pepper())? {
            warn!(user_id = user.id, "password mismatch");
            return Err(UserError::InvalidCredentials);
        }
        user.password.clear();
        Ok(user)
    }

    /// Makes sure `user` carries a plaintext remember token for the cookie,
    /// persisting a fresh one when it has none.
    pub async fn sign_in(&self, user: &mut User) -> Result<String, UserError> {
        if user.remember.is_empty() {
            user.remember = token::remember_token().map_err(UserError::RandomSource)?;
            self.update(user).await?;
        }
        Ok(user.remember.clone())
    }

    /// Rotates the remember token so the one held by the client stops working.
    pub async fn sign_out(&self, user: &mut User) -> Result<(), UserError> {
        user.remember = token::remember_token().map_err(UserError::RandomSource)?;
        self.update(user).await
    }
}
