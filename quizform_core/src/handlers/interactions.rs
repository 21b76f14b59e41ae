use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use super::parse_id;
use crate::error::Result;
use crate::extractors::ApiJson;
use crate::middleware::{AuthUser, OptionalAuthUser};
use crate::models::{Comment, CreateCommentRequest, LikeStatus};
use crate::AppState;

pub async fn toggle_like(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<LikeStatus>> {
    let id = parse_id(&id, "template")?;

    let status = state.interaction_service.toggle_like(id, &user).await?;
    Ok(Json(status))
}

pub async fn list_comments(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Comment>>> {
    let id = parse_id(&id, "template")?;

    let comments = state
        .interaction_service
        .list_comments(id, viewer.as_ref())
        .await?;
    Ok(Json(comments))
}

pub async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let id = parse_id(&id, "template")?;

    let comment = state.interaction_service.add_comment(id, &user, request).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let id = parse_id(&id, "template")?;
    let comment_id = parse_id(&comment_id, "comment")?;

    state
        .interaction_service
        .delete_comment(id, comment_id, &user)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
