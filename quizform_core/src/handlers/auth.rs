use axum::{extract::State, http::StatusCode, response::Json};
use tracing::info;

use crate::auth::models::{
    LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest,
    UserResponse,
};
use crate::error::AppError;
use crate::extractors::ApiJson;
use crate::middleware::auth::AuthUser;
use crate::AppState;

pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    info!("POST /api/auth/register - username: {}", request.username);

    let user_response = state.auth_service.register(request).await?;
    Ok((StatusCode::CREATED, Json(user_response)))
}

pub async fn login_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let login_response = state.auth_service.login(request).await?;
    Ok(Json(login_response))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshTokenRequest>,
) -> Result<Json<RefreshTokenResponse>, AppError> {
    let refresh_response = state
        .auth_service
        .refresh_token(&request.refresh_token)
        .await?;
    Ok(Json(refresh_response))
}

pub async fn get_current_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .auth_service
        .get_user_by_id(auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
