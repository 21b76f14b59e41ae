//! Administration endpoints. Every route here sits behind `require_admin`.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::models::UserResponse;
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{Page, PaginationQuery, Template, TemplateStatus};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminTemplatesQuery {
    pub status: Option<TemplateStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Vec<UserResponse>>> {
    let limit = state.config.forms.page_size(pagination.limit);

    let users = state
        .auth_service
        .list_users(limit, pagination.offset())
        .await?;
    Ok(Json(users))
}

pub async fn toggle_user_status(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>> {
    info!("POST /api/admin/users/{}/toggle-status by {}", user_id, admin.username);

    let user = state.auth_service.toggle_status(admin.user_id, user_id).await?;
    Ok(Json(user))
}

pub async fn toggle_user_role(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>> {
    info!("POST /api/admin/users/{}/toggle-role by {}", user_id, admin.username);

    let user = state.auth_service.toggle_role(admin.user_id, user_id).await?;
    Ok(Json(user))
}

pub async fn list_all_templates(
    State(state): State<AppState>,
    Query(query): Query<AdminTemplatesQuery>,
) -> Result<Json<Page<Template>>> {
    let pagination = PaginationQuery {
        limit: query.limit,
        offset: query.offset,
    };

    let page = state
        .template_service
        .list_all(query.status, &pagination)
        .await?;
    Ok(Json(page))
}
