//! Credential and OAuth account storage.
//!
//! Sign-up creates the user and its credentials account in one transaction;
//! OAuth sign-in upserts the user by email and the account by
//! (provider, provider_account_id) in one transaction. Passwords are hashed
//! with Argon2; verification never reveals which half of the lookup failed
//! beyond the taxonomy's NotFound/Unauthorized split.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use quorum_core::{
    new_v7, Account, Error, Result, SignInWithOAuthParams, SignUpParams, User,
};

/// Provider name used for password accounts.
pub const CREDENTIALS_PROVIDER: &str = "credentials";

/// Account id for a credentials account. Email lookups elsewhere are
/// case-insensitive, so the stored id is lowercased and every lookup must
/// lowercase too or the two halves of sign-in disagree.
fn credentials_account_id(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Hash a password with Argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored Argon2 hash.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| Error::Internal(format!("Stored password hash is invalid: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn map_row_to_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        username: row.get("username"),
        email: row.get("email"),
        image: row.get("image"),
        created_at: row.get("created_at"),
    }
}

/// PostgreSQL implementation of the auth repository.
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: Pool<Postgres>,
}

impl PgAuthRepository {
    /// Create a new PgAuthRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Register a user with credentials.
    ///
    /// User row and credentials account are created in one transaction;
    /// duplicate username/email checks run inside it so two concurrent
    /// sign-ups cannot both pass (the unique constraints are the backstop).
    pub async fn sign_up(&self, params: &SignUpParams) -> Result<User> {
        let now = Utc::now();
        let user_id = new_v7();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let username_taken: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM app_user WHERE LOWER(username) = LOWER($1)")
                .bind(&params.username)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;
        if username_taken.is_some() {
            return Err(Error::InvalidInput("Username is already taken".to_string()));
        }

        let email_taken: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM app_user WHERE LOWER(email) = LOWER($1)")
                .bind(&params.email)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;
        if email_taken.is_some() {
            return Err(Error::InvalidInput(
                "Email is already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&params.password)?;

        let row = sqlx::query(
            r#"
            INSERT INTO app_user (id, name, username, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, name, username, email, image, created_at
            "#,
        )
        .bind(user_id)
        .bind(&params.name)
        .bind(&params.username)
        .bind(&params.email)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        sqlx::query(
            r#"
            INSERT INTO account (id, user_id, provider, provider_account_id, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(new_v7())
        .bind(user_id)
        .bind(CREDENTIALS_PROVIDER)
        .bind(credentials_account_id(&params.email))
        .bind(&password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        Ok(map_row_to_user(&row))
    }

    /// Find an account by provider + provider account id.
    pub async fn find_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, provider, provider_account_id, password_hash, created_at
            FROM account
            WHERE provider = $1 AND provider_account_id = $2
            "#,
        )
        .bind(provider)
        .bind(provider_account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Account {
            id: r.get("id"),
            user_id: r.get("user_id"),
            provider: r.get("provider"),
            provider_account_id: r.get("provider_account_id"),
            password_hash: r.get("password_hash"),
            created_at: r.get("created_at"),
        }))
    }

    /// Check a credential pair against the stored account.
    ///
    /// NotFound if user or account is absent, Unauthorized on a password
    /// mismatch. No storage is mutated.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<User> {
        let row = sqlx::query(
            "SELECT id, name, username, email, image, created_at
             FROM app_user WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let user = row
            .as_ref()
            .map(map_row_to_user)
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

        let account = self
            .find_account(CREDENTIALS_PROVIDER, &credentials_account_id(email))
            .await?
            .ok_or_else(|| Error::NotFound("Account not found".to_string()))?;

        let stored_hash = account
            .password_hash
            .as_deref()
            .ok_or_else(|| Error::Internal("Credentials account has no password".to_string()))?;

        if !verify_password(password, stored_hash)? {
            return Err(Error::Unauthorized("Invalid password".to_string()));
        }

        Ok(user)
    }

    /// Sign in with a provider-asserted identity, creating the user and
    /// account on first contact.
    ///
    /// User is upserted by email (name/image follow the provider profile);
    /// the account link is upserted by (provider, provider_account_id).
    /// Both writes share one transaction.
    pub async fn sign_in_with_oauth(&self, params: &SignInWithOAuthParams) -> Result<User> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query(
            r#"
            INSERT INTO app_user (id, name, username, email, image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (email)
            DO UPDATE SET name = EXCLUDED.name, image = EXCLUDED.image, updated_at = $6
            RETURNING id, name, username, email, image, created_at
            "#,
        )
        .bind(new_v7())
        .bind(&params.user.name)
        .bind(&params.user.username)
        .bind(&params.user.email)
        .bind(&params.user.image)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let user = map_row_to_user(&row);

        sqlx::query(
            r#"
            INSERT INTO account (id, user_id, provider, provider_account_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (provider, provider_account_id) DO NOTHING
            "#,
        )
        .bind(new_v7())
        .bind(user.id)
        .bind(&params.provider)
        .bind(&params.provider_account_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("Str0ng!pass").unwrap();
        assert!(verify_password("Str0ng!pass", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("Str0ng!pass").unwrap();
        let b = hash_password("Str0ng!pass").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    // The account stored at sign-up and the one looked up at sign-in must
    // agree regardless of the casing the user typed either time.
    #[test]
    fn test_credentials_account_id_normalizes_case() {
        assert_eq!(
            credentials_account_id("Foo@Example.com"),
            credentials_account_id("foo@example.com")
        );
        assert_eq!(credentials_account_id("  Foo@X.com "), "foo@x.com");
    }
}
