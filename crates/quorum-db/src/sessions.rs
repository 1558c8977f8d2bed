//! Session repository implementation.
//!
//! Sessions are opaque bearer tokens. The raw token is returned to the
//! caller exactly once; only its SHA-256 hash is stored, so a leaked table
//! cannot be replayed.

use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use quorum_core::{new_v7, Error, Result, Session};

/// Session lifetime.
pub const SESSION_TTL_DAYS: i64 = 30;

/// Prefix identifying quorum session tokens.
pub const TOKEN_PREFIX: &str = "qs_";

/// Generate a random session token.
fn generate_token() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let secret: String = (0..48)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();
    format!("{}{}", TOKEN_PREFIX, secret)
}

/// Hash a token using SHA-256.
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// PostgreSQL implementation of the session repository.
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: Pool<Postgres>,
}

impl PgSessionRepository {
    /// Create a new PgSessionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create a session for a user. Returns the raw token (shown once) and
    /// the stored session.
    pub async fn create(&self, user_id: Uuid) -> Result<(String, Session)> {
        let token = generate_token();
        let now = Utc::now();
        let session = Session {
            id: new_v7(),
            user_id,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO session (id, user_id, token_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(hash_token(&token))
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok((token, session))
    }

    /// Resolve a bearer token to its unexpired session, if any.
    pub async fn find_valid(&self, token: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, expires_at, created_at
            FROM session
            WHERE token_hash = $1 AND expires_at > $2
            "#,
        )
        .bind(hash_token(token))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Session {
            id: r.get("id"),
            user_id: r.get("user_id"),
            expires_at: r.get("expires_at"),
            created_at: r.get("created_at"),
        }))
    }

    /// Revoke a session by its token (sign-out). Unknown tokens are a no-op.
    pub async fn delete(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM session WHERE token_hash = $1")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    /// Drop every expired session row. Invoked opportunistically by the API.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM session WHERE expires_at <= $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_token();
        assert!(token.starts_with(TOKEN_PREFIX));
        assert_eq!(token.len(), TOKEN_PREFIX.len() + 48);
        assert!(token[TOKEN_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_token_hash_deterministic() {
        let token = generate_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), hash_token("qs_other"));
        // 32-byte digest, hex encoded
        assert_eq!(hash_token(&token).len(), 64);
    }
}
