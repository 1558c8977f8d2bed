//! Question repository implementation.
//!
//! The create and edit paths are the atomic write coordinator in action:
//! each opens one transaction spanning the question row, the tag
//! reconciliation engine, and the join records, committing only when every
//! dependent write succeeded. Dropping the transaction on any error path
//! rolls everything back exactly once; `commit()` consumes it, so a
//! committed transaction can never be aborted afterwards.

use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use quorum_core::{
    new_v7, AskQuestionParams, EditQuestionParams, Error, Paginated, PaginatedSearchParams,
    Question, QuestionFilter, QuestionFull, Result, UserSummary,
};

use crate::escape_like;
use crate::tags::PgTagRepository;

const QUESTION_COLUMNS: &str = "q.id, q.title, q.content, q.author_id, q.view_count, \
     q.answer_count, q.upvote_count, q.downvote_count, q.created_at, q.updated_at";

fn build_question_filter_clause(filter: QuestionFilter) -> &'static str {
    match filter {
        QuestionFilter::Unanswered => "AND q.answer_count = 0 ",
        _ => "",
    }
}

fn build_question_order_clause(filter: QuestionFilter) -> &'static str {
    match filter {
        QuestionFilter::Oldest => "q.created_at ASC",
        QuestionFilter::Popular => "q.upvote_count DESC, q.created_at DESC",
        _ => "q.created_at DESC",
    }
}

fn map_row_to_question(row: &sqlx::postgres::PgRow) -> Question {
    Question {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        author_id: row.get("author_id"),
        view_count: row.get("view_count"),
        answer_count: row.get("answer_count"),
        upvote_count: row.get("upvote_count"),
        downvote_count: row.get("downvote_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn map_row_to_author(row: &sqlx::postgres::PgRow) -> UserSummary {
    UserSummary {
        id: row.get("author_id"),
        name: row.get("author_name"),
        image: row.get("author_image"),
    }
}

/// PostgreSQL implementation of the question repository.
#[derive(Clone)]
pub struct PgQuestionRepository {
    pool: Pool<Postgres>,
    tags: PgTagRepository,
}

impl PgQuestionRepository {
    /// Create a new PgQuestionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        let tags = PgTagRepository::new(pool.clone());
        Self { pool, tags }
    }

    /// Author lookup within the write transaction, so a successful commit is
    /// never followed by a read that can fail the whole action.
    async fn author_summary_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> Result<Option<UserSummary>> {
        let row = sqlx::query("SELECT id, name, image FROM app_user WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|r| UserSummary {
            id: r.get("id"),
            name: r.get("name"),
            image: r.get("image"),
        }))
    }

    /// Create a question with its 1..=3 tags.
    ///
    /// Question insert, tag upserts, and join records share one transaction;
    /// a failure in any of them leaves no trace of the others.
    pub async fn create(&self, author_id: Uuid, params: &AskQuestionParams) -> Result<QuestionFull> {
        let id = new_v7();
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            r#"
            INSERT INTO question (id, title, content, author_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            "#,
        )
        .bind(id)
        .bind(&params.title)
        .bind(&params.content)
        .bind(author_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let tags = self.tags.attach_to_question_tx(&mut tx, id, &params.tags).await?;
        let author = self.author_summary_tx(&mut tx, author_id).await?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "questions",
            op = "create",
            question_id = %id,
            result_count = tags.len(),
            "Question created"
        );

        Ok(QuestionFull {
            question: Question {
                id,
                title: params.title.clone(),
                content: params.content.clone(),
                author_id,
                view_count: 0,
                answer_count: 0,
                upvote_count: 0,
                downvote_count: 0,
                created_at: now,
                updated_at: now,
            },
            author,
            tags,
        })
    }

    /// Edit a question's title, content, and tag set.
    ///
    /// Fails with `QuestionNotFound` if the question is absent and
    /// `Forbidden` if `editor_id` is not the owning author; both checks run
    /// inside the transaction, before any mutation. The current-tags
    /// snapshot feeding the reconciliation diff is taken once, in the same
    /// transaction, so additions and removals see one consistent state.
    pub async fn update(&self, editor_id: Uuid, params: &EditQuestionParams) -> Result<QuestionFull> {
        let id = params.question_id;
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let owner: Option<Uuid> =
            sqlx::query_scalar("SELECT author_id FROM question WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;

        let owner = owner.ok_or(Error::QuestionNotFound(id))?;
        if owner != editor_id {
            return Err(Error::Forbidden(
                "Only the author can edit this question".to_string(),
            ));
        }

        let current = self.tags.for_question_tx(&mut tx, id).await?;
        let tags = self
            .tags
            .reconcile_for_question_tx(&mut tx, id, &current, &params.tags)
            .await?;

        let row = sqlx::query(&format!(
            "UPDATE question q SET title = $2, content = $3, updated_at = $4
             WHERE q.id = $1
             RETURNING {}",
            QUESTION_COLUMNS
        ))
        .bind(id)
        .bind(&params.title)
        .bind(&params.content)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let question = map_row_to_question(&row);
        let author = self.author_summary_tx(&mut tx, owner).await?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "questions",
            op = "update",
            question_id = %id,
            result_count = tags.len(),
            "Question updated"
        );

        Ok(QuestionFull {
            question,
            author,
            tags,
        })
    }

    /// Get a question with author and tags materialized by read-time joins.
    pub async fn get(&self, id: Uuid) -> Result<Option<QuestionFull>> {
        let row = sqlx::query(&format!(
            "SELECT {}, u.name AS author_name, u.image AS author_image
             FROM question q
             JOIN app_user u ON u.id = q.author_id
             WHERE q.id = $1",
            QUESTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let question = map_row_to_question(&row);
        let author = Some(map_row_to_author(&row));
        let tags = self.tags.for_question(id).await?;

        Ok(Some(QuestionFull {
            question,
            author,
            tags,
        }))
    }

    /// Atomically bump a question's view counter, returning the new value.
    pub async fn increment_views(&self, id: Uuid) -> Result<i64> {
        let count: Option<i64> = sqlx::query_scalar(
            "UPDATE question SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        count.ok_or(Error::QuestionNotFound(id))
    }

    /// List questions with substring search, sort filter, and pagination.
    ///
    /// The `recommended` filter yields an empty page unconditionally: the
    /// recommendation path is a product placeholder, not implemented yet.
    pub async fn list(&self, params: &PaginatedSearchParams) -> Result<Paginated<QuestionFull>> {
        let filter = QuestionFilter::from_token(params.filter.as_deref());
        if filter == QuestionFilter::Recommended {
            return Ok(Paginated::empty());
        }

        let window = params.window();
        let pattern = params
            .query
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .map(|q| format!("%{}%", escape_like(q.trim())));

        let mut where_clause = String::from("WHERE 1=1 ");
        let mut param_idx = 1;
        if pattern.is_some() {
            where_clause.push_str(&format!(
                "AND (q.title ILIKE ${i} OR q.content ILIKE ${i}) ",
                i = param_idx
            ));
            param_idx += 1;
        }
        where_clause.push_str(build_question_filter_clause(filter));

        let count_sql = format!("SELECT COUNT(*) FROM question q {}", where_clause);
        let mut count_query = sqlx::query_scalar(&count_sql);
        if let Some(p) = &pattern {
            count_query = count_query.bind(p);
        }
        let total: i64 = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let select_sql = format!(
            "SELECT {}, u.name AS author_name, u.image AS author_image
             FROM question q
             JOIN app_user u ON u.id = q.author_id
             {}
             ORDER BY {} OFFSET ${} LIMIT ${}",
            QUESTION_COLUMNS,
            where_clause,
            build_question_order_clause(filter),
            param_idx,
            param_idx + 1
        );
        let mut select_query = sqlx::query(&select_sql);
        if let Some(p) = &pattern {
            select_query = select_query.bind(p);
        }
        let rows = select_query
            .bind(window.skip)
            .bind(window.limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        self.assemble_page(rows, window.skip, total).await
    }

    /// List the questions linked to one tag, with optional title search.
    pub async fn list_for_tag(
        &self,
        tag_id: Uuid,
        params: &PaginatedSearchParams,
    ) -> Result<Paginated<QuestionFull>> {
        let window = params.window();
        let filter = QuestionFilter::from_token(params.filter.as_deref());
        let pattern = params
            .query
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .map(|q| format!("%{}%", escape_like(q.trim())));

        let mut where_clause = String::from(
            "WHERE EXISTS (SELECT 1 FROM tag_question tq \
             WHERE tq.question_id = q.id AND tq.tag_id = $1) ",
        );
        let mut param_idx = 2;
        if pattern.is_some() {
            where_clause.push_str(&format!("AND q.title ILIKE ${} ", param_idx));
            param_idx += 1;
        }

        let count_sql = format!("SELECT COUNT(*) FROM question q {}", where_clause);
        let mut count_query = sqlx::query_scalar(&count_sql).bind(tag_id);
        if let Some(p) = &pattern {
            count_query = count_query.bind(p);
        }
        let total: i64 = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let select_sql = format!(
            "SELECT {}, u.name AS author_name, u.image AS author_image
             FROM question q
             JOIN app_user u ON u.id = q.author_id
             {}
             ORDER BY {} OFFSET ${} LIMIT ${}",
            QUESTION_COLUMNS,
            where_clause,
            build_question_order_clause(filter),
            param_idx,
            param_idx + 1
        );
        let mut select_query = sqlx::query(&select_sql).bind(tag_id);
        if let Some(p) = &pattern {
            select_query = select_query.bind(p);
        }
        let rows = select_query
            .bind(window.skip)
            .bind(window.limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        self.assemble_page(rows, window.skip, total).await
    }

    /// Attach authors (already joined into the rows) and batch-loaded tags.
    async fn assemble_page(
        &self,
        rows: Vec<sqlx::postgres::PgRow>,
        skip: i64,
        total: i64,
    ) -> Result<Paginated<QuestionFull>> {
        let questions: Vec<(Question, UserSummary)> = rows
            .iter()
            .map(|row| (map_row_to_question(row), map_row_to_author(row)))
            .collect();

        let ids: Vec<Uuid> = questions.iter().map(|(q, _)| q.id).collect();
        let mut tags_by_question = self.tags.for_questions(&ids).await?;

        let items = questions
            .into_iter()
            .map(|(question, author)| {
                let tags = tags_by_question.remove(&question.id).unwrap_or_default();
                QuestionFull {
                    question,
                    author: Some(author),
                    tags,
                }
            })
            .collect();

        Ok(Paginated::new(items, skip, total))
    }
}
