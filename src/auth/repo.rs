use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// User record in the database. `user_uuid` is the stable external identifier
/// every downstream record is keyed by; `username` only matters for login.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub gender: String,
    pub age: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub user_uuid: String,
}

impl User {
    /// Find a user by username.
    pub async fn find_by_username(db: &SqlitePool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, gender, age, username, password_hash, user_uuid
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password and a fresh external uuid.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        db: &SqlitePool,
        full_name: &str,
        gender: &str,
        age: i64,
        username: &str,
        password_hash: &str,
        user_uuid: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (full_name, gender, age, username, password_hash, user_uuid)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, full_name, gender, age, username, password_hash, user_uuid
            "#,
        )
        .bind(full_name)
        .bind(gender)
        .bind(age)
        .bind(username)
        .bind(password_hash)
        .bind(user_uuid)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn count(db: &SqlitePool) -> anyhow::Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await?;
        Ok(n)
    }
}
