//! Authentication endpoints: sign-up, sign-in, OAuth sign-in, sign-out.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::{debug, warn};

use quorum_core::{run_pipeline, SignInParams, SignInWithOAuthParams, SignUpParams, User};

use crate::extract::Auth;
use crate::response::{ok, ApiResult};
use crate::AppState;

/// POST /auth/sign-up
///
/// Registers a credentials user and signs them in. A session-creation
/// failure after the account exists is logged and swallowed: the response is
/// still a 201 with `token: null`, and the user can sign in normally.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(params): Json<SignUpParams>,
) -> ApiResult<impl IntoResponse> {
    let authorized = run_pipeline(params, None, false)?;
    let user = state.db.auth.sign_up(&authorized.params).await?;

    let token = match state.db.sessions.create(user.id).await {
        Ok((token, _)) => Some(token),
        Err(err) => {
            warn!(
                subsystem = "api",
                component = "auth",
                op = "sign_up",
                user_id = %user.id,
                error = %err,
                "Sign-in after sign-up failed; account was created"
            );
            None
        }
    };

    debug!(
        subsystem = "api",
        component = "auth",
        op = "sign_up",
        user_id = %user.id,
        "User registered"
    );

    Ok((StatusCode::CREATED, ok(session_payload(user, token))))
}

/// POST /auth/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    Json(params): Json<SignInParams>,
) -> ApiResult<impl IntoResponse> {
    let authorized = run_pipeline(params, None, false)?;
    let user = state
        .db
        .auth
        .verify_credentials(&authorized.params.email, &authorized.params.password)
        .await?;
    let (token, _) = state.db.sessions.create(user.id).await?;

    Ok(ok(session_payload(user, Some(token))))
}

/// POST /auth/sign-in-with-oauth
///
/// The provider handshake happens upstream; this endpoint receives the
/// already-verified profile and upserts user + account link.
pub async fn sign_in_with_oauth(
    State(state): State<AppState>,
    Json(params): Json<SignInWithOAuthParams>,
) -> ApiResult<impl IntoResponse> {
    let authorized = run_pipeline(params, None, false)?;
    let user = state.db.auth.sign_in_with_oauth(&authorized.params).await?;
    let (token, _) = state.db.sessions.create(user.id).await?;

    Ok(ok(session_payload(user, Some(token))))
}

/// POST /auth/sign-out
///
/// Revokes the presented token. Idempotent: unknown tokens are a no-op.
pub async fn sign_out(State(state): State<AppState>, auth: Auth) -> ApiResult<impl IntoResponse> {
    if let Some(token) = auth.token {
        state.db.sessions.delete(&token).await?;
    }
    Ok(ok(json!({ "signedOut": true })))
}

fn session_payload(user: User, token: Option<String>) -> serde_json::Value {
    json!({ "user": user, "token": token })
}
