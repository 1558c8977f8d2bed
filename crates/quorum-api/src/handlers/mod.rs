//! HTTP handlers, grouped by entity.

pub mod answers;
pub mod auth;
pub mod questions;
pub mod tags;
pub mod users;
