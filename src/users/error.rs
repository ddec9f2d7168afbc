use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::auth::{password::PasswordError, token::TokenError};

const PREFIX: &str = "users: ";
const GENERIC: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum UserError {
    #[error("users: resource not found")]
    NotFound,
    #[error("users: ID provided was invalid")]
    InvalidId,

    #[error("users: email address is required")]
    EmailRequired,
    #[error("users: invalid email address")]
    EmailInvalid,
    #[error("users: email address is already taken")]
    EmailTaken,

    #[error("users: password is required")]
    PasswordRequired,
    #[error("users: password must be at least 8 characters long")]
    PasswordTooShort,
    #[error("users: password hashing failed: {0}")]
    PasswordHashing(String),

    #[error("users: remember token required")]
    RememberRequired,
    #[error("users: remember token should be at least 32 bytes")]
    RememberTooShort,
    #[error("users: remember token hashing failed: {0}")]
    RememberHashing(String),

    #[error("users: invalid email and/or password")]
    InvalidCredentials,

    #[error(transparent)]
    RandomSource(TokenError),
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl From<PasswordError> for UserError {
    fn from(e: PasswordError) -> Self {
        UserError::PasswordHashing(e.to_string())
    }
}

impl UserError {
    /// True for failures that never reached storage.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            UserError::InvalidId
                | UserError::EmailRequired
                | UserError::EmailInvalid
                | UserError::EmailTaken
                | UserError::PasswordRequired
                | UserError::PasswordTooShort
                | UserError::RememberRequired
                | UserError::RememberTooShort
        )
    }

    /// A uniqueness constraint fired in storage, e.g. two concurrent
    /// registrations with the same email.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            UserError::Storage(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }

    /// Message safe to show to the person filling in the form.
    pub fn public(&self) -> String {
        if self.is_unique_violation() {
            return UserError::EmailTaken.public();
        }
        match self {
            UserError::PasswordHashing(_)
            | UserError::RememberHashing(_)
            | UserError::RandomSource(_)
            | UserError::Storage(_) => GENERIC.to_string(),
            other => {
                let msg = other.to_string();
                let msg = msg.strip_prefix(PREFIX).unwrap_or(&msg);
                let mut chars = msg.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        if self.is_unique_violation() {
            return StatusCode::CONFLICT;
        }
        match self {
            UserError::NotFound => StatusCode::NOT_FOUND,
            UserError::EmailTaken => StatusCode::CONFLICT,
            UserError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            e if e.is_validation() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "user operation failed");
        }
        (status, self.public()).into_response()
    }
}
