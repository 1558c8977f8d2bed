//! Tag endpoints.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde_json::json;
use uuid::Uuid;

use quorum_core::{run_pipeline, Error, PaginatedSearchParams};

use crate::extract::Auth;
use crate::response::{ok, ApiResult};
use crate::AppState;

/// GET /tags
pub async fn list(
    State(state): State<AppState>,
    auth: Auth,
    Query(params): Query<PaginatedSearchParams>,
) -> ApiResult<impl IntoResponse> {
    let authorized = run_pipeline(params, auth.session, false)?;
    let page = state.db.tags.list(&authorized.params).await?;
    Ok(ok(page))
}

/// GET /tags/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let tag = state.db.tags.get(id).await?.ok_or(Error::TagNotFound(id))?;
    Ok(ok(tag))
}

/// GET /tags/:id/questions
///
/// The tag detail plus one page of its questions.
pub async fn questions(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<Uuid>,
    Query(params): Query<PaginatedSearchParams>,
) -> ApiResult<impl IntoResponse> {
    let authorized = run_pipeline(params, auth.session, false)?;
    let tag = state.db.tags.get(id).await?.ok_or(Error::TagNotFound(id))?;
    let page = state
        .db
        .questions
        .list_for_tag(id, &authorized.params)
        .await?;
    Ok(ok(json!({ "tag": tag, "questions": page })))
}
