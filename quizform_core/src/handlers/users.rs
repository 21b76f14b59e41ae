use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::info;

use crate::auth::models::{ChangePasswordRequest, UpdateProfileRequest, UserResponse};
use crate::error::Result;
use crate::extractors::ApiJson;
use crate::middleware::AuthUser;
use crate::models::{Page, PaginationQuery, Template, UserResponseSummary};
use crate::AppState;

pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    info!("PUT /api/users/me/profile - user: {}", user.user_id);

    let updated = state.auth_service.update_profile(user.user_id, request).await?;
    Ok(Json(updated))
}

/// Answers 204 once the new password is stored.
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<StatusCode> {
    info!("PUT /api/users/me/password - user: {}", user.user_id);

    state.auth_service.change_password(user.user_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's own templates, including pending and archived ones.
pub async fn my_templates(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Page<Template>>> {
    let page = state
        .template_service
        .list_for_owner(user.user_id, &pagination)
        .await?;
    Ok(Json(page))
}

pub async fn my_responses(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<UserResponseSummary>>> {
    let responses = state.template_service.responses_by_user(user.user_id).await?;
    Ok(Json(responses))
}
