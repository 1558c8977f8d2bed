//! User endpoints.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use quorum_core::Error;

use crate::extract::RequireAuth;
use crate::response::{ok, ApiResult};
use crate::AppState;

/// GET /me
///
/// The authenticated user's own profile.
pub async fn me(State(state): State<AppState>, auth: RequireAuth) -> ApiResult<impl IntoResponse> {
    let user = state
        .db
        .users
        .get(auth.session.user_id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
    Ok(ok(user))
}

/// GET /users/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .db
        .users
        .get(id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
    Ok(ok(user))
}
