use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
///
/// `password` and `remember` only live on the in-memory value handed to
/// create/update; storage only ever sees their digests.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[sqlx(skip)]
    #[serde(skip)]
    pub password: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(skip)]
    #[serde(skip)]
    pub remember: String,
    #[serde(skip_serializing)]
    pub remember_hash: String,
    pub is_admin: bool,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<OffsetDateTime>,
}

impl User {
    /// Candidate built from registration input.
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_never_serialize() {
        let mut user = User::new("Ada", "ada@example.com", "plaintext-pw");
        user.password_hash = "$argon2id$digest".into();
        user.remember = "plain-token".into();
        user.remember_hash = "token-digest".into();

        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("ada@example.com"));
        assert!(!json.contains("plaintext-pw"));
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("plain-token"));
        assert!(!json.contains("token-digest"));
    }
}
