//! Error types for quorum.

use thiserror::Error;
use uuid::Uuid;

use crate::validation::FieldErrors;

/// Result type alias using quorum's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for quorum operations.
///
/// Every action returns one of these variants; nothing is thrown past the
/// action boundary. The API layer maps the taxonomy onto HTTP status codes
/// (400/401/403/404/500).
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Input failed schema validation; carries per-field messages
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// No authenticated session attached to the request
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted (e.g. editing another author's question)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Question not found
    #[error("Question not found: {0}")]
    QuestionNotFound(Uuid),

    /// Tag not found
    #[error("Tag not found: {0}")]
    TagNotFound(Uuid),

    /// Invalid input outside the schema-validation path
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_question_not_found() {
        let id = Uuid::nil();
        let err = Error::QuestionNotFound(id);
        assert_eq!(err.to_string(), format!("Question not found: {}", id));
    }

    #[test]
    fn test_error_display_tag_not_found() {
        let id = Uuid::new_v4();
        let err = Error::TagNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_error_display_unauthorized() {
        let err = Error::Unauthorized("no session".to_string());
        assert_eq!(err.to_string(), "Unauthorized: no session");
    }

    #[test]
    fn test_error_display_forbidden() {
        let err = Error::Forbidden("not the author".to_string());
        assert_eq!(err.to_string(), "Forbidden: not the author");
    }

    #[test]
    fn test_error_display_validation() {
        let mut errors = FieldErrors::new();
        errors.push("title", "Title is required.");
        let err = Error::Validation(errors);
        assert!(err.to_string().contains("title"));
        assert!(err.to_string().contains("Title is required."));
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("negative count".to_string());
        assert_eq!(err.to_string(), "Invalid input: negative count");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("DATABASE_URL not set".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: DATABASE_URL not set"
        );
    }

    #[test]
    fn test_error_display_internal() {
        let err = Error::Internal("unexpected state".to_string());
        assert_eq!(err.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("I/O error:"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}
