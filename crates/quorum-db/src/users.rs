//! User repository implementation.

use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use quorum_core::{Error, Result, User};

fn map_row_to_user(row: sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        username: row.get("username"),
        email: row.get("email"),
        image: row.get("image"),
        created_at: row.get("created_at"),
    }
}

const USER_COLUMNS: &str = "id, name, username, email, image, created_at";

/// PostgreSQL implementation of the user repository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a user by id.
    pub async fn get(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM app_user WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(map_row_to_user))
    }

    /// Find a user by email (exact, case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM app_user WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(map_row_to_user))
    }

    /// Find a user by username (exact, case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM app_user WHERE LOWER(username) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(map_row_to_user))
    }
}
