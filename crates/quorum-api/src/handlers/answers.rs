//! Answer endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use quorum_core::{run_pipeline, CreateAnswerParams, PaginatedSearchParams};

use crate::extract::{Auth, RequireAuth};
use crate::response::{ok, ApiResult};
use crate::AppState;

/// POST /answers
pub async fn create(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(params): Json<CreateAnswerParams>,
) -> ApiResult<impl IntoResponse> {
    let authorized = run_pipeline(params, Some(auth.session), true)?;
    let author_id = authorized.user_id()?;
    let answer = state
        .db
        .answers
        .create(author_id, &authorized.params)
        .await?;
    Ok((StatusCode::CREATED, ok(answer)))
}

/// GET /questions/:id/answers
pub async fn list_for_question(
    State(state): State<AppState>,
    auth: Auth,
    Path(question_id): Path<Uuid>,
    Query(params): Query<PaginatedSearchParams>,
) -> ApiResult<impl IntoResponse> {
    let authorized = run_pipeline(params, auth.session, false)?;
    let page = state
        .db
        .answers
        .list_for_question(question_id, &authorized.params)
        .await?;
    Ok(ok(page))
}
