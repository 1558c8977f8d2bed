//! Answer repository implementation.
//!
//! Answer creation is the counter-maintenance path: the answer row and the
//! parent question's `answer_count` increment live in the same transaction,
//! so there is never an orphan answer with an unincremented counter or an
//! incremented counter without a persisted answer.

use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use quorum_core::{
    new_v7, Answer, AnswerFilter, AnswerFull, CreateAnswerParams, Error, Paginated,
    PaginatedSearchParams, Result, UserSummary,
};

fn build_answer_order_clause(filter: AnswerFilter) -> &'static str {
    match filter {
        AnswerFilter::Latest => "a.created_at DESC",
        AnswerFilter::Oldest => "a.created_at ASC",
        AnswerFilter::Popular => "a.upvote_count DESC, a.created_at DESC",
    }
}

/// PostgreSQL implementation of the answer repository.
#[derive(Clone)]
pub struct PgAnswerRepository {
    pool: Pool<Postgres>,
}

impl PgAnswerRepository {
    /// Create a new PgAnswerRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create an answer and increment the parent question's answer counter.
    ///
    /// Fails with `QuestionNotFound` before any mutation if the question is
    /// absent. The existence check locks the parent row so a concurrent
    /// question deletion cannot race the insert.
    pub async fn create(&self, author_id: Uuid, params: &CreateAnswerParams) -> Result<Answer> {
        let id = new_v7();
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM question WHERE id = $1 FOR UPDATE")
                .bind(params.question_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;

        if exists.is_none() {
            return Err(Error::QuestionNotFound(params.question_id));
        }

        sqlx::query(
            r#"
            INSERT INTO answer (id, question_id, author_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(params.question_id)
        .bind(author_id)
        .bind(&params.content)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        sqlx::query("UPDATE question SET answer_count = answer_count + 1 WHERE id = $1")
            .bind(params.question_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "answers",
            op = "create",
            answer_id = %id,
            question_id = %params.question_id,
            "Answer created"
        );

        Ok(Answer {
            id,
            question_id: params.question_id,
            author_id,
            content: params.content.clone(),
            upvote_count: 0,
            downvote_count: 0,
            created_at: now,
        })
    }

    /// List a question's answers with sort filter and pagination.
    pub async fn list_for_question(
        &self,
        question_id: Uuid,
        params: &PaginatedSearchParams,
    ) -> Result<Paginated<AnswerFull>> {
        let window = params.window();
        let filter = AnswerFilter::from_token(params.filter.as_deref());

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM answer WHERE question_id = $1")
            .bind(question_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let select_sql = format!(
            "SELECT a.id, a.question_id, a.author_id, a.content, a.upvote_count,
                    a.downvote_count, a.created_at,
                    u.name AS author_name, u.image AS author_image
             FROM answer a
             JOIN app_user u ON u.id = a.author_id
             WHERE a.question_id = $1
             ORDER BY {} OFFSET $2 LIMIT $3",
            build_answer_order_clause(filter)
        );
        let rows = sqlx::query(&select_sql)
            .bind(question_id)
            .bind(window.skip)
            .bind(window.limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let items = rows
            .into_iter()
            .map(|row| AnswerFull {
                answer: Answer {
                    id: row.get("id"),
                    question_id: row.get("question_id"),
                    author_id: row.get("author_id"),
                    content: row.get("content"),
                    upvote_count: row.get("upvote_count"),
                    downvote_count: row.get("downvote_count"),
                    created_at: row.get("created_at"),
                },
                author: Some(UserSummary {
                    id: row.get("author_id"),
                    name: row.get("author_name"),
                    image: row.get("author_image"),
                }),
            })
            .collect();

        Ok(Paginated::new(items, window.skip, total))
    }
}
