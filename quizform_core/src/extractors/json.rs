//! JSON body extractor whose rejections use the API error shape

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;

/// Like [`axum::Json`], but a malformed body answers with
/// `{ "error", "status", "reason": "bad_request" }` instead of plain text.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiJsonRejection::from(rejection)),
        }
    }
}

#[derive(Debug)]
pub enum ApiJsonRejection {
    MissingContentType,
    Syntax(String),
    Data(String),
    Other(String),
}

impl From<JsonRejection> for ApiJsonRejection {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => ApiJsonRejection::MissingContentType,
            JsonRejection::JsonSyntaxError(e) => ApiJsonRejection::Syntax(e.body_text()),
            JsonRejection::JsonDataError(e) => ApiJsonRejection::Data(e.body_text()),
            other => ApiJsonRejection::Other(other.body_text()),
        }
    }
}

impl IntoResponse for ApiJsonRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiJsonRejection::MissingContentType => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Expected request with `Content-Type: application/json`".to_string(),
            ),
            ApiJsonRejection::Syntax(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiJsonRejection::Data(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiJsonRejection::Other(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        tracing::warn!(status = status.as_u16(), "rejected request body: {}", message);

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
            "reason": "bad_request",
        }));

        (status, body).into_response()
    }
}
