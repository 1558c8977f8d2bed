//! Session extractors.
//!
//! `Auth` resolves the `Authorization: Bearer <token>` header to a session;
//! requests without a token get `session: None`, and a session-store failure
//! propagates as 500. `RequireAuth` wraps it and rejects anonymous requests
//! with 401.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use quorum_core::Session;

use crate::response::ApiError;
use crate::AppState;

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Optional authentication: the resolved session, if the request carried a
/// valid unexpired token.
pub struct Auth {
    pub session: Option<Session>,
    pub token: Option<String>,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Auth {
                session: None,
                token: None,
            });
        };

        // A failed lookup is a store failure, not a missing session; it must
        // surface as 500, never degrade the request to anonymous.
        let session = state.db.sessions.find_valid(&token).await?;
        Ok(Auth {
            session,
            token: Some(token),
        })
    }
}

/// Mandatory authentication: rejects with 401 when no valid session exists.
pub struct RequireAuth {
    pub session: Session,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = Auth::from_request_parts(parts, state).await?;
        match auth.session {
            Some(session) => Ok(RequireAuth { session }),
            None => Err(ApiError::Unauthorized(
                "Authentication required".to_string(),
            )),
        }
    }
}
