use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::{error::UserError, model::User};

/// Storage for users. Implementations trust the caller to have validated,
/// normalized and hashed the record already.
#[async_trait]
pub trait UserDb: Send + Sync {
    async fn by_id(&self, id: i64) -> Result<User, UserError>;
    async fn by_email(&self, email: &str) -> Result<User, UserError>;
    async fn by_remember_hash(&self, hash: &str) -> Result<User, UserError>;
    /// Inserts `user`, filling in `id` and timestamps.
    async fn create(&self, user: &mut User) -> Result<(), UserError>;
    async fn update(&self, user: &mut User) -> Result<(), UserError>;
    /// Soft delete.
    async fn delete(&self, id: i64) -> Result<(), UserError>;
}

const COLUMNS: &str =
    "id, name, email, password_hash, remember_hash, is_admin, created_at, updated_at, deleted_at";

/// Rows with a deletion timestamp are invisible to every query below.
const LIVE_ROWS: &str = "deleted_at IS NULL";

fn select_live(filter: &str) -> String {
    format!("SELECT {COLUMNS} FROM users WHERE {LIVE_ROWS} AND {filter}")
}

fn found(row: Option<User>) -> Result<User, UserError> {
    row.ok_or(UserError::NotFound)
}

#[derive(Clone)]
pub struct PgUserDb {
    db: PgPool,
}

impl PgUserDb {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDb for PgUserDb {
    async fn by_id(&self, id: i64) -> Result<User, UserError> {
        let row = sqlx::query_as::<_, User>(&select_live("id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        found(row)
    }

    async fn by_email(&self, email: &str) -> Result<User, UserError> {
        let row = sqlx::query_as::<_, User>(&select_live("email = $1"))
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        found(row)
    }

    async fn by_remember_hash(&self, hash: &str) -> Result<User, UserError> {
        let row = sqlx::query_as::<_, User>(&select_live("remember_hash = $1"))
            .bind(hash)
            .fetch_optional(&self.db)
            .await?;
        found(row)
    }

    async fn create(&self, user: &mut User) -> Result<(), UserError> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash, remember_hash, is_admin) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        );
        let stored = sqlx::query_as::<_, User>(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.remember_hash)
            .bind(user.is_admin)
            .fetch_one(&self.db)
            .await?;
        debug!(user_id = stored.id, "user row inserted");
        user.id = stored.id;
        user.created_at = stored.created_at;
        user.updated_at = stored.updated_at;
        Ok(())
    }

    async fn update(&self, user: &mut User) -> Result<(), UserError> {
        let sql = format!(
            "UPDATE users \
             SET name = $2, email = $3, password_hash = $4, remember_hash = $5, \
                 is_admin = $6, updated_at = now() \
             WHERE id = $1 AND {LIVE_ROWS} \
             RETURNING {COLUMNS}"
        );
        let stored = sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.remember_hash)
            .bind(user.is_admin)
            .fetch_optional(&self.db)
            .await?;
        let stored = found(stored)?;
        user.updated_at = stored.updated_at;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), UserError> {
        // A zero id must never reach the UPDATE, whatever the caller checked.
        if id <= 0 {
            return Err(UserError::InvalidId);
        }
        let sql = format!("UPDATE users SET deleted_at = now() WHERE id = $1 AND {LIVE_ROWS}");
        let done = sqlx::query(&sql).bind(id).execute(&self.db).await?;
        if done.rows_affected() == 0 {
            return Err(UserError::NotFound);
        }
        debug!(user_id = id, "user soft-deleted");
        Ok(())
    }
}
