//! # quorum-db
//!
//! PostgreSQL storage layer for quorum.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for questions, tags, answers, and identity
//! - The tag reconciliation engine (atomic upsert-with-increment plus
//!   join-record maintenance)
//! - Transactional write paths for every multi-entity mutation
//!
//! ## Example
//!
//! ```rust,ignore
//! use quorum_db::Database;
//! use quorum_core::AskQuestionParams;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/quorum").await?;
//!
//!     let question = db.questions.create(author_id, &AskQuestionParams {
//!         title: "How do I exit vim?".to_string(),
//!         content: "Asking for a friend.".to_string(),
//!         tags: vec!["vim".to_string()],
//!     }).await?;
//!
//!     println!("Created question: {}", question.question.id);
//!     Ok(())
//! }
//! ```

pub mod answers;
pub mod auth;
pub mod pool;
pub mod questions;
pub mod sessions;
pub mod tags;
pub mod users;

// Test fixtures for integration tests
// Note: always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

pub use answers::PgAnswerRepository;
pub use auth::{hash_password, verify_password, PgAuthRepository, CREDENTIALS_PROVIDER};
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use questions::PgQuestionRepository;
pub use sessions::PgSessionRepository;
pub use tags::{diff_tags, normalize_tag_names, PgTagRepository, TagDiff};
pub use users::PgUserRepository;

// Re-export core types
pub use quorum_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Top-level database handle: one repository per entity over a shared pool.
///
/// Owned by the composition root and injected where needed; construct a
/// fresh one per test run instead of sharing process-wide state.
#[derive(Clone)]
pub struct Database {
    pub questions: PgQuestionRepository,
    pub tags: PgTagRepository,
    pub answers: PgAnswerRepository,
    pub users: PgUserRepository,
    pub auth: PgAuthRepository,
    pub sessions: PgSessionRepository,
    pool: sqlx::Pool<sqlx::Postgres>,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            questions: PgQuestionRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            answers: PgAnswerRepository::new(pool.clone()),
            users: PgUserRepository::new(pool.clone()),
            auth: PgAuthRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("100%_sure"), "100\\%\\_sure");
        assert_eq!(escape_like(r"back\slash"), r"back\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
