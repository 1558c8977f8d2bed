//! The request pipeline: validation gate, then authorization gate.
//!
//! Every action — read or write — enters through [`run`] before it may touch
//! storage. The pipeline itself is pure orchestration: it owns no I/O and
//! performs no mutation. Either gate's failure short-circuits the other.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::Session;
use crate::validation::Validate;

/// Parameters that have passed both gates, plus the session (if any).
#[derive(Debug, Clone)]
pub struct Authorized<P> {
    pub params: P,
    pub session: Option<Session>,
}

impl<P> Authorized<P> {
    /// The authenticated user's id.
    ///
    /// When the pipeline ran with `require_auth`, the session is guaranteed
    /// present; this accessor still returns `Unauthorized` rather than
    /// panicking if a handler calls it on an unauthenticated run.
    pub fn user_id(&self) -> Result<Uuid> {
        self.session
            .as_ref()
            .map(|s| s.user_id)
            .ok_or_else(|| Error::Unauthorized("Authentication required".to_string()))
    }
}

/// Validate `params` against their schema, then enforce authentication.
///
/// Validation always runs first; a schema failure is returned before the
/// session is even inspected. Gate failures are detected before any storage
/// mutation begins and never enter a transaction scope.
pub fn run<P: Validate>(
    params: P,
    session: Option<Session>,
    require_auth: bool,
) -> Result<Authorized<P>> {
    params.validate().map_err(Error::Validation)?;

    if require_auth && session.is_none() {
        return Err(Error::Unauthorized(
            "Authentication required".to_string(),
        ));
    }

    Ok(Authorized { params, session })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AskQuestionParams, PaginatedSearchParams};
    use chrono::{Duration, Utc};

    fn session() -> Session {
        Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            expires_at: Utc::now() + Duration::hours(1),
            created_at: Utc::now(),
        }
    }

    fn valid_params() -> AskQuestionParams {
        AskQuestionParams {
            title: "title".to_string(),
            content: "content".to_string(),
            tags: vec!["rust".to_string()],
        }
    }

    fn invalid_params() -> AskQuestionParams {
        AskQuestionParams {
            title: String::new(),
            content: "content".to_string(),
            tags: vec!["rust".to_string()],
        }
    }

    #[test]
    fn test_valid_and_authenticated_passes() {
        let s = session();
        let out = run(valid_params(), Some(s.clone()), true).unwrap();
        assert_eq!(out.user_id().unwrap(), s.user_id);
    }

    #[test]
    fn test_validation_runs_before_authorization() {
        // Invalid params with no session: validation must win.
        let err = run(invalid_params(), None, true).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_unauthenticated_write_short_circuits() {
        let err = run(valid_params(), None, true).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[test]
    fn test_auth_not_required_passes_without_session() {
        let out = run(PaginatedSearchParams::default(), None, false).unwrap();
        assert!(out.session.is_none());
        assert!(matches!(out.user_id(), Err(Error::Unauthorized(_))));
    }
}
