//! Application error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::forms::FieldErrors;
use crate::validation::ValidationResult;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Answers failed validation ({} field(s))", .0.len())]
    Validation(FieldErrors),

    #[error("Request failed validation")]
    InvalidInput(ValidationResult),

    #[error("Template is not accepting responses")]
    TemplateInactive,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    InternalServerError,

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Machine-readable reason code carried next to the message.
    pub fn reason(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) | AppError::JsonError(_) => "bad_request",
            AppError::Validation(_) => "validation_failed",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::TemplateInactive => "template_inactive",
            AppError::NotFound(_) => "not_found",
            AppError::Authentication(_) => "unauthenticated",
            AppError::Authorization(_) => "forbidden",
            AppError::Database(_) => "persistence_error",
            AppError::InternalServerError | AppError::IoError(_) | AppError::Other(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::Validation(_)
            | AppError::InvalidInput(_)
            | AppError::TemplateInactive
            | AppError::JsonError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::InternalServerError
            | AppError::Database(_)
            | AppError::IoError(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let reason = self.reason();

        let mut body = match &self {
            AppError::Validation(errors) => json!({
                "error": "One or more answers are invalid",
                "errors": errors,
            }),
            AppError::InvalidInput(result) => json!({
                "error": "Request failed validation",
                "errors": result.errors,
            }),
            AppError::TemplateInactive => json!({
                "error": "Template is not active",
            }),
            AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Authentication(msg)
            | AppError::Authorization(msg) => json!({ "error": msg }),
            AppError::InternalServerError => json!({ "error": "Internal server error" }),
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                json!({ "error": "Database error" })
            }
            AppError::IoError(err) => {
                tracing::error!("IO error: {:?}", err);
                json!({ "error": "Internal server error" })
            }
            AppError::JsonError(err) => {
                tracing::error!("JSON error: {:?}", err);
                json!({ "error": "Invalid JSON data" })
            }
            AppError::Other(err) => {
                tracing::error!("Unexpected error: {:?}", err);
                json!({ "error": "Internal server error" })
            }
        };

        body["status"] = json!(status.as_u16());
        body["reason"] = json!(reason);

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::BadRequest("Resource already exists".to_string())
            }
            _ => AppError::Database(err.to_string()),
        }
    }
}
