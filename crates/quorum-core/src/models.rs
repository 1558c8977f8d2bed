//! Core data models for quorum.
//!
//! These types are shared across all quorum crates and represent the forum's
//! domain entities plus the request/response DTOs every action speaks.
//!
//! All wire-facing structs serialize in camelCase; that is the shape the
//! front end consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// USERS & IDENTITY
// =============================================================================

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Lightweight author reference embedded in question/answer responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
}

/// A credential or identity-provider account linked to a user.
///
/// `password_hash` is present only for `provider = "credentials"` accounts
/// and never serialized.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub provider_account_id: String,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An authenticated session, resolved from a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// QUESTIONS
// =============================================================================

/// A question as stored. Counters are denormalized and maintained by the
/// write paths that invalidate them, never recomputed on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub view_count: i64,
    pub answer_count: i64,
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A question with its tag set and author materialized by read-time joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFull {
    pub question: Question,
    pub author: Option<UserSummary>,
    pub tags: Vec<TagSummary>,
}

// =============================================================================
// TAGS
// =============================================================================

/// A tag. `name` is globally unique under case-insensitive comparison;
/// `question_count` equals the number of active tag-question links.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub question_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity + name, the shape tag reconciliation works over.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TagSummary {
    pub id: Uuid,
    pub name: String,
}

// =============================================================================
// ANSWERS
// =============================================================================

/// An answer to a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: Uuid,
    pub question_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub created_at: DateTime<Utc>,
}

/// An answer with its author materialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFull {
    pub answer: Answer,
    pub author: Option<UserSummary>,
}

// =============================================================================
// ACTION PARAMETERS
// =============================================================================

/// Parameters for creating a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskQuestionParams {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Parameters for editing a question. Only the owning author may edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditQuestionParams {
    pub question_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Parameters for posting an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnswerParams {
    pub question_id: Uuid,
    pub content: String,
}

/// Credential sign-up parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpParams {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Credential sign-in parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInParams {
    pub email: String,
    pub password: String,
}

/// Identity asserted by a third-party provider after its handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthUserProfile {
    pub name: String,
    pub username: String,
    pub email: String,
    pub image: Option<String>,
}

/// OAuth sign-in parameters. The provider handshake itself happens upstream;
/// we receive the already-verified profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInWithOAuthParams {
    pub provider: String,
    pub provider_account_id: String,
    pub user: OAuthUserProfile,
}

// =============================================================================
// LISTING / PAGINATION
// =============================================================================

/// Default page size for listing endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Shared listing parameters: substring search, sort filter token, and
/// offset pagination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedSearchParams {
    pub query: Option<String>,
    pub filter: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Offset window computed from page/pageSize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: i64,
    pub limit: i64,
}

impl PaginatedSearchParams {
    /// Resolve page/pageSize (with defaults and bounds) into skip/limit.
    pub fn window(&self) -> PageWindow {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        PageWindow {
            skip: i64::from(page - 1) * i64::from(page_size),
            limit: i64::from(page_size),
        }
    }
}

/// True when another page exists past the returned window.
pub fn has_next_page(skip: i64, returned: usize, total: i64) -> bool {
    skip + (returned as i64) < total
}

/// One page of results plus the cursorless "load more" flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub is_next: bool,
    pub total: i64,
}

impl<T> Paginated<T> {
    /// Assemble a page, deriving `is_next` from the window and total.
    pub fn new(items: Vec<T>, skip: i64, total: i64) -> Self {
        let is_next = has_next_page(skip, items.len(), total);
        Self {
            items,
            is_next,
            total,
        }
    }

    /// An unconditionally empty page (used by the `recommended` placeholder).
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            is_next: false,
            total: 0,
        }
    }
}

// =============================================================================
// SORT FILTERS
// =============================================================================

/// Sort orders for question listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionFilter {
    Newest,
    Oldest,
    Popular,
    Unanswered,
    Recommended,
}

impl QuestionFilter {
    /// Parse a filter token; unknown or absent tokens fall back to `Newest`.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("newest") => Self::Newest,
            Some("oldest") => Self::Oldest,
            Some("popular") => Self::Popular,
            Some("unanswered") => Self::Unanswered,
            Some("recommended") => Self::Recommended,
            _ => Self::Newest,
        }
    }
}

/// Sort orders for tag listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagFilter {
    Popular,
    Recent,
    Oldest,
    Name,
}

impl TagFilter {
    /// Parse a filter token; unknown or absent tokens fall back to `Popular`.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("recent") => Self::Recent,
            Some("oldest") => Self::Oldest,
            Some("name") => Self::Name,
            _ => Self::Popular,
        }
    }
}

/// Sort orders for answer listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerFilter {
    Latest,
    Oldest,
    Popular,
}

impl AnswerFilter {
    /// Parse a filter token; unknown or absent tokens fall back to `Latest`.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("oldest") => Self::Oldest,
            Some("popular") => Self::Popular,
            _ => Self::Latest,
        }
    }
}
