use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use tracing::info;

use crate::error::Result;
use crate::forms::{descriptors, TypeDescriptor};
use crate::models::{Page, PopularTemplate, TagCount, Template};
use crate::search::SearchQuery;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

pub async fn search_templates(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Page<Template>>> {
    info!("GET /api/search - q: {:?}, topic: {:?}, tag: {:?}", query.q, query.topic, query.tag);

    let page = state.search_engine.search(&query).await?;
    Ok(Json(page))
}

pub async fn popular_tags(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<TagCount>>> {
    let tags = state.search_engine.popular_tags(query.limit).await?;
    Ok(Json(tags))
}

pub async fn popular_templates(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<PopularTemplate>>> {
    let templates = state.search_engine.popular_templates(query.limit).await?;
    Ok(Json(templates))
}

/// Descriptors of every question type, for form renderers.
pub async fn question_types() -> Json<Vec<TypeDescriptor>> {
    Json(descriptors())
}
