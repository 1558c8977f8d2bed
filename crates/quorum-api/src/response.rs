//! The uniform action envelope and API error mapping.
//!
//! Every endpoint — success or failure — answers with the same discriminated
//! shape:
//!
//! ```json
//! {"success": true,  "data": ...}
//! {"success": false, "error": {"message": "...", "details": {"field": ["..."]}}}
//! ```
//!
//! `details` appears only for field-level validation failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::{json, Value};

use quorum_core::{Error, FieldErrors};

/// Wrap a payload in the success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

/// Handler result type.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// API-facing error with an HTTP status mapping.
#[derive(Debug)]
pub enum ApiError {
    Validation(FieldErrors),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The failure envelope body.
    pub fn body(&self) -> Value {
        let error = match self {
            ApiError::Validation(details) => json!({
                "message": "Validation failed",
                "details": details,
            }),
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Internal(msg) => json!({ "message": msg }),
        };
        json!({ "success": false, "error": error })
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(details) => ApiError::Validation(details),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::QuestionNotFound(_) | Error::TagNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            // Storage and internal failures surface as opaque 500s; the
            // cause is logged where it happened.
            Error::Database(e) => ApiError::Internal(e.to_string()),
            Error::Config(msg) | Error::Internal(msg) => ApiError::Internal(msg),
            Error::Io(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation(FieldErrors::new()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("no".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("no".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("gone".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_body_carries_details() {
        let mut details = FieldErrors::new();
        details.push("title", "Title is required.");
        let body = ApiError::Validation(details).body();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"]["message"], json!("Validation failed"));
        assert_eq!(body["error"]["details"]["title"][0], json!("Title is required."));
    }

    #[test]
    fn test_non_validation_body_has_no_details() {
        let body = ApiError::NotFound("Question not found".into()).body();
        assert_eq!(body["error"]["message"], json!("Question not found"));
        assert!(body["error"].get("details").is_none());
    }

    #[test]
    fn test_core_error_conversion() {
        let err: ApiError = quorum_core::Error::QuestionNotFound(Uuid::nil()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = quorum_core::Error::Forbidden("not the author".into()).into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err: ApiError = quorum_core::Error::InvalidInput("bad".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    // A storage failure during session resolution must answer 500, never be
    // mistaken for a missing session (401).
    #[test]
    fn test_session_store_failure_maps_to_internal() {
        let err: ApiError = quorum_core::Error::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = err.body();
        assert_eq!(body["success"], json!(false));
    }

    #[test]
    fn test_ok_envelope_shape() {
        let Json(value) = ok(json!({"id": 1}));
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"]["id"], json!(1));
    }
}
