use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::info;

use super::parse_id;
use crate::error::Result;
use crate::extractors::ApiJson;
use crate::middleware::{AuthUser, OptionalAuthUser};
use crate::models::{
    Page, PaginationQuery, StoredResponse, Template, TemplateDetail, TemplateInput,
};
use crate::AppState;

pub async fn list_templates(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Page<Template>>> {
    info!("GET /api/templates - limit: {:?}, offset: {:?}", pagination.limit, pagination.offset);

    let page = state.template_service.list(&pagination).await?;
    Ok(Json(page))
}

pub async fn create_template(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<TemplateInput>,
) -> Result<(StatusCode, Json<Template>)> {
    info!("POST /api/templates - title: {}", input.title);

    let template = state.template_service.create(&user, input).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn get_template(
    State(state): State<AppState>,
    OptionalAuthUser(viewer): OptionalAuthUser,
    Path(id): Path<String>,
) -> Result<Json<TemplateDetail>> {
    let id = parse_id(&id, "template")?;

    let detail = state.template_service.get(id, viewer.as_ref()).await?;
    Ok(Json(detail))
}

pub async fn update_template(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<TemplateInput>,
) -> Result<Json<Template>> {
    let id = parse_id(&id, "template")?;
    info!("PUT /api/templates/{}", id);

    let template = state.template_service.update(id, &user, input).await?;
    Ok(Json(template))
}

pub async fn delete_template(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_id(&id, "template")?;
    info!("DELETE /api/templates/{}", id);

    state.template_service.delete(id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn archive_template(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Template>> {
    let id = parse_id(&id, "template")?;

    let template = state.template_service.archive(id, &user).await?;
    Ok(Json(template))
}

/// Mounted behind `require_admin`.
pub async fn approve_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Template>> {
    let id = parse_id(&id, "template")?;

    let template = state.template_service.approve(id).await?;
    Ok(Json(template))
}

pub async fn list_template_responses(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<StoredResponse>>> {
    let id = parse_id(&id, "template")?;

    let responses = state.template_service.list_responses(id, &user).await?;
    Ok(Json(responses))
}
