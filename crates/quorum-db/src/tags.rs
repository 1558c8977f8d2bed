//! Tag repository and the tag reconciliation engine.
//!
//! Tags are globally unique under case-insensitive comparison and carry a
//! denormalized `question_count` equal to the number of active
//! tag-question links. Both invariants are maintained here, inside the
//! caller's transaction: resolution uses a single atomic
//! upsert-with-increment so concurrent writers introducing the same name
//! can neither duplicate the tag nor under-count it.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use quorum_core::{
    new_v7, Error, Paginated, PaginatedSearchParams, Result, Tag, TagFilter, TagSummary,
};

use crate::escape_like;

/// Trim and case-insensitively dedupe a request's tag names.
///
/// First casing wins and request order is preserved, so
/// `["React", "react"]` collapses to `["React"]`.
pub fn normalize_tag_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// Add/remove sets for an edit, computed from one consistent snapshot of the
/// question's current tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDiff {
    /// Desired names with no case-insensitive exact match among current tags.
    pub to_add: Vec<String>,
    /// Current tags with no case-insensitive exact match among desired names.
    pub to_remove: Vec<TagSummary>,
}

impl TagDiff {
    /// True when the edit leaves the tag set untouched.
    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compute the reconciliation diff.
///
/// Matching is exact case-insensitive equality — substring containment would
/// conflate `react` and `reactjs`. A name present in both sets is left
/// untouched (never decremented-then-incremented).
pub fn diff_tags(current: &[TagSummary], desired: &[String]) -> TagDiff {
    let desired = normalize_tag_names(desired);
    let current_keys: HashSet<String> = current.iter().map(|t| t.name.to_lowercase()).collect();
    let desired_keys: HashSet<String> = desired.iter().map(|n| n.to_lowercase()).collect();

    let to_add = desired
        .into_iter()
        .filter(|name| !current_keys.contains(&name.to_lowercase()))
        .collect();
    let to_remove = current
        .iter()
        .filter(|tag| !desired_keys.contains(&tag.name.to_lowercase()))
        .cloned()
        .collect();

    TagDiff { to_add, to_remove }
}

fn build_tag_order_clause(filter: TagFilter) -> &'static str {
    match filter {
        TagFilter::Popular => "question_count DESC, LOWER(name) ASC",
        TagFilter::Recent => "created_at DESC",
        TagFilter::Oldest => "created_at ASC",
        TagFilter::Name => "LOWER(name) ASC",
    }
}

fn map_row_to_tag(row: sqlx::postgres::PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        question_count: row.get("question_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// PostgreSQL implementation of the tag repository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // TRANSACTION METHODS (reconciliation engine)
    // =========================================================================

    /// Resolve a name to a tag in one atomic statement: insert with
    /// `question_count = 1` if absent, otherwise increment the existing
    /// row's counter. The stored casing is whatever was first inserted.
    pub async fn upsert_with_increment_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
    ) -> Result<TagSummary> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO tag (id, name, question_count, created_at, updated_at)
            VALUES ($1, $2, 1, $3, $3)
            ON CONFLICT (LOWER(name))
            DO UPDATE SET question_count = tag.question_count + 1, updated_at = $3
            RETURNING id, name
            "#,
        )
        .bind(new_v7())
        .bind(name)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(TagSummary {
            id: row.get("id"),
            name: row.get("name"),
        })
    }

    /// Atomically decrement a tag's question counter. The counter may reach
    /// zero; orphaned tags are tolerated, never deleted.
    pub async fn decrement_count_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tag_id: Uuid,
    ) -> Result<()> {
        sqlx::query("UPDATE tag SET question_count = question_count - 1, updated_at = $2 WHERE id = $1")
            .bind(tag_id)
            .bind(Utc::now())
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    /// Create the join record linking a tag to a question. The
    /// `(tag_id, question_id)` uniqueness constraint is the invariant;
    /// `DO NOTHING` is its backstop.
    pub async fn link_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tag_id: Uuid,
        question_id: Uuid,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tag_question (id, tag_id, question_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tag_id, question_id) DO NOTHING
            "#,
        )
        .bind(new_v7())
        .bind(tag_id)
        .bind(question_id)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Delete the join record linking a tag to a question.
    pub async fn unlink_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tag_id: Uuid,
        question_id: Uuid,
    ) -> Result<()> {
        sqlx::query("DELETE FROM tag_question WHERE tag_id = $1 AND question_id = $2")
            .bind(tag_id)
            .bind(question_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    /// Attach-only resolution for question creation: resolve each name via
    /// upsert-with-increment, then create one join record per tag.
    ///
    /// Returns the resolved tag identities in request order.
    pub async fn attach_to_question_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        question_id: Uuid,
        names: &[String],
    ) -> Result<Vec<TagSummary>> {
        let mut resolved = Vec::new();
        for name in normalize_tag_names(names) {
            let tag = self.upsert_with_increment_tx(tx, &name).await?;
            self.link_tx(tx, tag.id, question_id).await?;
            resolved.push(tag);
        }
        Ok(resolved)
    }

    /// Reconcile a question's tag set against the desired names.
    ///
    /// `current` must be a snapshot taken before any mutation in this
    /// operation; additions and removals are both computed from it, so an
    /// unchanged tag is touched at most zero times.
    ///
    /// Returns the question's resulting tag set.
    pub async fn reconcile_for_question_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        question_id: Uuid,
        current: &[TagSummary],
        desired: &[String],
    ) -> Result<Vec<TagSummary>> {
        let diff = diff_tags(current, desired);

        let removed_ids: HashSet<Uuid> = diff.to_remove.iter().map(|t| t.id).collect();
        let mut result: Vec<TagSummary> = current
            .iter()
            .filter(|t| !removed_ids.contains(&t.id))
            .cloned()
            .collect();

        for tag in &diff.to_remove {
            self.decrement_count_tx(tx, tag.id).await?;
            self.unlink_tx(tx, tag.id, question_id).await?;
        }

        for name in &diff.to_add {
            let tag = self.upsert_with_increment_tx(tx, name).await?;
            self.link_tx(tx, tag.id, question_id).await?;
            result.push(tag);
        }

        Ok(result)
    }

    /// Snapshot a question's current tags (id + name) within a transaction.
    pub async fn for_question_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        question_id: Uuid,
    ) -> Result<Vec<TagSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name
            FROM tag_question tq
            JOIN tag t ON t.id = tq.tag_id
            WHERE tq.question_id = $1
            ORDER BY tq.created_at, tq.id
            "#,
        )
        .bind(question_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| TagSummary {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Get a tag by id.
    pub async fn get(&self, id: Uuid) -> Result<Option<Tag>> {
        let row = sqlx::query(
            "SELECT id, name, question_count, created_at, updated_at FROM tag WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(map_row_to_tag))
    }

    /// Tags linked to one question, in link order.
    pub async fn for_question(&self, question_id: Uuid) -> Result<Vec<TagSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name
            FROM tag_question tq
            JOIN tag t ON t.id = tq.tag_id
            WHERE tq.question_id = $1
            ORDER BY tq.created_at, tq.id
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| TagSummary {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    /// Tags for a batch of questions in one query, keyed by question id.
    /// Listing endpoints use this to avoid per-row tag lookups.
    pub async fn for_questions(
        &self,
        question_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<TagSummary>>> {
        if question_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT tq.question_id, t.id, t.name
            FROM tag_question tq
            JOIN tag t ON t.id = tq.tag_id
            WHERE tq.question_id = ANY($1)
            ORDER BY tq.created_at, tq.id
            "#,
        )
        .bind(question_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut by_question: HashMap<Uuid, Vec<TagSummary>> = HashMap::new();
        for row in rows {
            let question_id: Uuid = row.get("question_id");
            by_question.entry(question_id).or_default().push(TagSummary {
                id: row.get("id"),
                name: row.get("name"),
            });
        }
        Ok(by_question)
    }

    /// List tags with substring search, sort filter, and offset pagination.
    pub async fn list(&self, params: &PaginatedSearchParams) -> Result<Paginated<Tag>> {
        let window = params.window();
        let filter = TagFilter::from_token(params.filter.as_deref());
        let order = build_tag_order_clause(filter);

        let pattern = params
            .query
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .map(|q| format!("%{}%", escape_like(q.trim())));

        let (total, rows) = match &pattern {
            Some(pattern) => {
                let total: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM tag WHERE name ILIKE $1")
                        .bind(pattern)
                        .fetch_one(&self.pool)
                        .await
                        .map_err(Error::Database)?;

                let query = format!(
                    "SELECT id, name, question_count, created_at, updated_at
                     FROM tag WHERE name ILIKE $1
                     ORDER BY {} OFFSET $2 LIMIT $3",
                    order
                );
                let rows = sqlx::query(&query)
                    .bind(pattern)
                    .bind(window.skip)
                    .bind(window.limit)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(Error::Database)?;
                (total, rows)
            }
            None => {
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tag")
                    .fetch_one(&self.pool)
                    .await
                    .map_err(Error::Database)?;

                let query = format!(
                    "SELECT id, name, question_count, created_at, updated_at
                     FROM tag ORDER BY {} OFFSET $1 LIMIT $2",
                    order
                );
                let rows = sqlx::query(&query)
                    .bind(window.skip)
                    .bind(window.limit)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(Error::Database)?;
                (total, rows)
            }
        };

        let tags: Vec<Tag> = rows.into_iter().map(map_row_to_tag).collect();
        Ok(Paginated::new(tags, window.skip, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(name: &str) -> TagSummary {
        TagSummary {
            id: new_v7(),
            name: name.to_string(),
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_collapses_case_variants() {
        assert_eq!(
            normalize_tag_names(&names(&["React", "react"])),
            vec!["React".to_string()]
        );
    }

    #[test]
    fn test_normalize_trims_and_drops_empty() {
        assert_eq!(
            normalize_tag_names(&names(&["  rust ", "", "   "])),
            vec!["rust".to_string()]
        );
    }

    #[test]
    fn test_normalize_preserves_order_and_first_casing() {
        assert_eq!(
            normalize_tag_names(&names(&["Rust", "axum", "RUST", "Axum"])),
            vec!["Rust".to_string(), "axum".to_string()]
        );
    }

    #[test]
    fn test_diff_unchanged_set_is_noop() {
        let current = vec![summary("React"), summary("rust")];
        // Same names, different casing and order
        let diff = diff_tags(&current, &names(&["RUST", "react"]));
        assert!(diff.is_noop());
    }

    #[test]
    fn test_diff_add_and_remove() {
        let current = vec![summary("react"), summary("mongodb")];
        let diff = diff_tags(&current, &names(&["react", "postgres"]));
        assert_eq!(diff.to_add, vec!["postgres".to_string()]);
        assert_eq!(diff.to_remove.len(), 1);
        assert_eq!(diff.to_remove[0].name, "mongodb");
    }

    #[test]
    fn test_diff_exact_match_not_substring() {
        // "reactjs" is not "react"; both sides must treat them as distinct.
        let current = vec![summary("react")];
        let diff = diff_tags(&current, &names(&["reactjs"]));
        assert_eq!(diff.to_add, vec!["reactjs".to_string()]);
        assert_eq!(diff.to_remove[0].name, "react");
    }

    #[test]
    fn test_diff_dedupes_desired_names() {
        let current: Vec<TagSummary> = Vec::new();
        let diff = diff_tags(&current, &names(&["React", "react", "rust"]));
        assert_eq!(diff.to_add, vec!["React".to_string(), "rust".to_string()]);
    }

    #[test]
    fn test_diff_empty_desired_removes_all() {
        let current = vec![summary("a"), summary("b")];
        let diff = diff_tags(&current, &[]);
        assert!(diff.to_add.is_empty());
        assert_eq!(diff.to_remove.len(), 2);
    }

    #[test]
    fn test_tag_order_clauses() {
        assert_eq!(
            build_tag_order_clause(TagFilter::Popular),
            "question_count DESC, LOWER(name) ASC"
        );
        assert_eq!(build_tag_order_clause(TagFilter::Recent), "created_at DESC");
        assert_eq!(build_tag_order_clause(TagFilter::Oldest), "created_at ASC");
        assert_eq!(build_tag_order_clause(TagFilter::Name), "LOWER(name) ASC");
    }
}
