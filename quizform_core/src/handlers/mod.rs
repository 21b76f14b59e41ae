//! HTTP handlers, one module per resource

pub mod admin;
pub mod auth;
pub mod health;
pub mod interactions;
pub mod responses;
pub mod routes;
pub mod search;
pub mod templates;
pub mod users;

use uuid::Uuid;

use crate::error::{AppError, Result};

/// Parse an id taken from the path, answering 400 instead of axum's
/// plain-text rejection.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {} id: {}", what, raw)))
}
