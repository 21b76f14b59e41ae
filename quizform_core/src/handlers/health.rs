//! Health check handler

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::warn;

use crate::models::ApiResponse;
use crate::AppState;

/// 200 with database statistics, or 503 when the database is unreachable.
pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let mut health_info = json!({
        "status": "healthy",
        "app": state.app_name,
        "version": state.version,
        "timestamp": chrono::Utc::now().timestamp(),
    });

    if let Err(e) = state.db_manager.health_check().await {
        warn!("Database health check failed: {}", e);
        health_info["status"] = json!("unhealthy");
        health_info["database_status"] = json!("unhealthy");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(ApiResponse::success(health_info)));
    }

    health_info["database_status"] = json!("healthy");
    match state.db_manager.get_stats().await {
        Ok(stats) => health_info["database_stats"] = json!(stats),
        Err(e) => warn!("Failed to collect database stats: {}", e),
    }

    (StatusCode::OK, Json(ApiResponse::success(health_info)))
}
