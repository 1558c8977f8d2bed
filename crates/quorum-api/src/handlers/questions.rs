//! Question endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use quorum_core::{
    run_pipeline, AskQuestionParams, EditQuestionParams, Error, PaginatedSearchParams,
};

use crate::extract::{Auth, RequireAuth};
use crate::response::{ok, ApiResult};
use crate::AppState;

/// GET /questions
pub async fn list(
    State(state): State<AppState>,
    auth: Auth,
    Query(params): Query<PaginatedSearchParams>,
) -> ApiResult<impl IntoResponse> {
    let authorized = run_pipeline(params, auth.session, false)?;
    let page = state.db.questions.list(&authorized.params).await?;
    Ok(ok(page))
}

/// POST /questions
pub async fn create(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(params): Json<AskQuestionParams>,
) -> ApiResult<impl IntoResponse> {
    let authorized = run_pipeline(params, Some(auth.session), true)?;
    let author_id = authorized.user_id()?;
    let question = state
        .db
        .questions
        .create(author_id, &authorized.params)
        .await?;
    Ok((StatusCode::CREATED, ok(question)))
}

/// GET /questions/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let question = state
        .db
        .questions
        .get(id)
        .await?
        .ok_or(Error::QuestionNotFound(id))?;
    Ok(ok(question))
}

/// Edit body: the question id comes from the path.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditQuestionBody {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// PUT /questions/:id
pub async fn update(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<Uuid>,
    Json(body): Json<EditQuestionBody>,
) -> ApiResult<impl IntoResponse> {
    let params = EditQuestionParams {
        question_id: id,
        title: body.title,
        content: body.content,
        tags: body.tags,
    };
    let authorized = run_pipeline(params, Some(auth.session), true)?;
    let editor_id = authorized.user_id()?;
    let question = state
        .db
        .questions
        .update(editor_id, &authorized.params)
        .await?;
    Ok(ok(question))
}

/// POST /questions/:id/views
pub async fn increment_views(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let views = state.db.questions.increment_views(id).await?;
    Ok(ok(json!({ "views": views })))
}
