//! In-memory `UserDb` for tests. Mirrors the partial unique indexes and
//! soft-delete behavior of the Postgres schema.

use std::{borrow::Cow, sync::Mutex};

use async_trait::async_trait;
use sqlx::error::{DatabaseError, ErrorKind};
use time::OffsetDateTime;

use super::{error::UserError, model::User, repo::UserDb};

#[derive(Default)]
pub struct MemoryUserDb {
    rows: Mutex<Vec<User>>,
}

impl MemoryUserDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows, deleted ones included.
    pub fn rows(&self) -> Vec<User> {
        self.rows.lock().unwrap().clone()
    }

    fn find(&self, pred: impl Fn(&User) -> bool) -> Result<User, UserError> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.deleted_at.is_none() && pred(u))
            .cloned()
            .ok_or(UserError::NotFound)
    }
}

/// What Postgres reports when a unique index rejects a row.
#[derive(Debug)]
struct UniqueViolation {
    message: String,
    constraint: &'static str,
}

impl std::fmt::Display for UniqueViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for UniqueViolation {}

impl DatabaseError for UniqueViolation {
    fn message(&self) -> &str {
        &self.message
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed("23505"))
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn constraint(&self) -> Option<&str> {
        Some(self.constraint)
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::UniqueViolation
    }
}

fn unique_violation(constraint: &'static str) -> UserError {
    UserError::Storage(sqlx::Error::Database(Box::new(UniqueViolation {
        message: format!("duplicate key value violates unique constraint \"{constraint}\""),
        constraint,
    })))
}

fn check_unique(rows: &[User], user: &User) -> Result<(), UserError> {
    let others = rows.iter().filter(|u| u.deleted_at.is_none() && u.id != user.id);
    for other in others {
        if other.email == user.email {
            return Err(unique_violation("users_email_live_idx"));
        }
        if other.remember_hash == user.remember_hash {
            return Err(unique_violation("users_remember_hash_live_idx"));
        }
    }
    Ok(())
}

#[async_trait]
impl UserDb for MemoryUserDb {
    async fn by_id(&self, id: i64) -> Result<User, UserError> {
        self.find(|u| u.id == id)
    }

    async fn by_email(&self, email: &str) -> Result<User, UserError> {
        self.find(|u| u.email == email)
    }

    async fn by_remember_hash(&self, hash: &str) -> Result<User, UserError> {
        self.find(|u| u.remember_hash == hash)
    }

    async fn create(&self, user: &mut User) -> Result<(), UserError> {
        let mut rows = self.rows.lock().unwrap();
        user.id = 0;
        check_unique(&rows, user)?;
        let now = OffsetDateTime::now_utc();
        user.id = rows.len() as i64 + 1;
        user.created_at = Some(now);
        user.updated_at = Some(now);
        let mut stored = user.clone();
        stored.password.clear();
        stored.remember.clear();
        rows.push(stored);
        Ok(())
    }

    async fn update(&self, user: &mut User) -> Result<(), UserError> {
        let mut rows = self.rows.lock().unwrap();
        check_unique(&rows, user)?;
        let row = rows
            .iter_mut()
            .find(|u| u.id == user.id && u.deleted_at.is_none())
            .ok_or(UserError::NotFound)?;
        let now = OffsetDateTime::now_utc();
        row.name = user.name.clone();
        row.email = user.email.clone();
        row.password_hash = user.password_hash.clone();
        row.remember_hash = user.remember_hash.clone();
        row.is_admin = user.is_admin;
        row.updated_at = Some(now);
        user.updated_at = Some(now);
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), UserError> {
        if id <= 0 {
            return Err(UserError::InvalidId);
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .ok_or(UserError::NotFound)?;
        row.deleted_at = Some(OffsetDateTime::now_utc());
        Ok(())
    }
}
