use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::info;

use super::parse_id;
use crate::error::Result;
use crate::extractors::ApiJson;
use crate::middleware::OptionalAuthUser;
use crate::models::{DryRunResponse, StoredResponse, SubmitResponseRequest};
use crate::AppState;

/// `POST /api/templates/{id}/responses`. Answers 201 with the stored record.
pub async fn submit_response(
    State(state): State<AppState>,
    OptionalAuthUser(submitter): OptionalAuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<SubmitResponseRequest>,
) -> Result<(StatusCode, Json<StoredResponse>)> {
    let id = parse_id(&id, "template")?;
    info!("POST /api/templates/{}/responses - {} answer(s)", id, request.answers.len());

    let response = state
        .submission_service
        .submit(id, request.answers, submitter.as_ref())
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /api/templates/{id}/validate`. Always 200; the body carries the
/// per-question outcome and whether the set would be accepted.
pub async fn validate_answers(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<SubmitResponseRequest>,
) -> Result<Json<DryRunResponse>> {
    let id = parse_id(&id, "template")?;

    let report = state
        .submission_service
        .dry_run(id, &request.answers, viewer.as_ref())
        .await?;

    Ok(Json(report))
}
