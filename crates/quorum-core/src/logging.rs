//! Structured logging field name constants for quorum.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |

/// Correlation ID propagated across a request. Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event. Values: "api", "db", "auth".
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem. Examples: "pool", "questions", "tags".
pub const COMPONENT: &str = "component";

/// Logical operation name. Examples: "create_question", "reconcile_tags".
pub const OPERATION: &str = "op";

/// Question UUID being operated on.
pub const QUESTION_ID: &str = "question_id";

/// Tag UUID being operated on.
pub const TAG_ID: &str = "tag_id";

/// Answer UUID being operated on.
pub const ANSWER_ID: &str = "answer_id";

/// User UUID attached to the request.
pub const USER_ID: &str = "user_id";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a listing or query.
pub const RESULT_COUNT: &str = "result_count";
