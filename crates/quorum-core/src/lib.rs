//! # quorum-core
//!
//! Core types, validation schemas, and the request pipeline for quorum.
//!
//! This crate provides the foundational data structures that the storage and
//! API crates depend on: the error taxonomy, domain models, declarative
//! per-field validation, and the validate-then-authorize pipeline every
//! action enters through.

pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod uuid_utils;
pub mod validation;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use pipeline::{run as run_pipeline, Authorized};
pub use uuid_utils::{is_v7, new_v7};
pub use validation::{FieldErrors, StringRules, Validate};
