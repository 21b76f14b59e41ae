//! Route table

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use super::{admin, auth, health, interactions, responses, search, templates, users};
use crate::middleware::{rate_limit_middleware, require_admin, RateLimiter, RateLimits};
use crate::AppState;

/// The global API budget is layered in `create_app`; the stricter auth and
/// search budgets apply only to their own routes.
pub fn create_routes(limits: &RateLimits) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::handle_health))
        .route("/api/question-types", get(search::question_types))
        .merge(template_routes())
        .merge(search_routes(limits.search.clone()))
        .merge(credential_routes(limits.auth.clone()))
        .merge(account_routes())
        .merge(admin_routes())
}

fn template_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route("/api/templates/popular", get(search::popular_templates))
        .route(
            "/api/templates/:id",
            get(templates::get_template)
                .put(templates::update_template)
                .delete(templates::delete_template),
        )
        .route("/api/templates/:id/archive", post(templates::archive_template))
        .route("/api/templates/:id/validate", post(responses::validate_answers))
        .route(
            "/api/templates/:id/responses",
            get(templates::list_template_responses).post(responses::submit_response),
        )
        .route("/api/templates/:id/like", post(interactions::toggle_like))
        .route(
            "/api/templates/:id/comments",
            get(interactions::list_comments).post(interactions::add_comment),
        )
        .route(
            "/api/templates/:id/comments/:comment_id",
            delete(interactions::delete_comment),
        )
}

fn search_routes(limiter: RateLimiter) -> Router<AppState> {
    Router::new()
        .route("/api/search", get(search::search_templates))
        .route("/api/tags/popular", get(search::popular_tags))
        .route_layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
}

fn credential_routes(limiter: RateLimiter) -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(auth::register_user))
        .route("/api/auth/login", post(auth::login_user))
        .route_layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/refresh", post(auth::refresh_token))
        .route("/api/auth/me", get(auth::get_current_user))
        .route("/api/users/me/profile", put(users::update_profile))
        .route("/api/users/me/password", put(users::change_password))
        .route("/api/users/me/templates", get(users::my_templates))
        .route("/api/users/me/responses", get(users::my_responses))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/templates/:id/approve", post(templates::approve_template))
        .route("/api/admin/users", get(admin::list_users))
        .route(
            "/api/admin/users/:id/toggle-status",
            post(admin::toggle_user_status),
        )
        .route("/api/admin/users/:id/toggle-role", post(admin::toggle_user_role))
        .route("/api/admin/templates", get(admin::list_all_templates))
        .route_layer(middleware::from_fn(require_admin))
}
