//! Core library of the QuizForm server: form templates, answer validation,
//! submissions, accounts and the HTTP routes that expose them.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod extractors;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod search;
pub mod services;
pub mod validation;

pub use auth::{AuthService, JwtService, UserRepository};
pub use config::AppConfig;
pub use database::{get_database_pool, run_migrations, DatabaseManager};
pub use error::{AppError, Result};
pub use handlers::routes::create_routes;
pub use middleware::rate_limit::{RateLimiter, RateLimits};
pub use search::SearchEngine;
pub use services::{InteractionService, SubmissionService, TemplateService};

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{middleware as axum_middleware, Router};
use sqlx::SqlitePool;
use tokio::signal;
use tracing::{error, info};

use database::{InteractionRepository, ResponseRepository, TemplateRepository};

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub config: Arc<AppConfig>,
    pub db_manager: DatabaseManager,
    pub auth_service: AuthService,
    pub template_service: TemplateService,
    pub submission_service: SubmissionService,
    pub interaction_service: InteractionService,
    pub search_engine: SearchEngine,
    pub rate_limits: RateLimits,
}

impl AppState {
    /// Wires every service onto one pool. The pool must already be migrated.
    pub fn new(config: AppConfig, pool: SqlitePool) -> Result<Self> {
        let jwt_service = JwtService::new(&config.auth)?;
        let limits = Arc::new(config.forms.clone());

        let template_repository = TemplateRepository::new(pool.clone());
        let response_repository = ResponseRepository::new(pool.clone());

        Ok(Self {
            app_name: "QuizForm".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            db_manager: DatabaseManager::new(pool.clone()),
            auth_service: AuthService::new(UserRepository::new(pool.clone()), jwt_service),
            template_service: TemplateService::new(
                template_repository.clone(),
                response_repository.clone(),
                limits.clone(),
            ),
            submission_service: SubmissionService::new(
                Arc::new(template_repository.clone()),
                Arc::new(response_repository),
            ),
            interaction_service: InteractionService::new(
                template_repository,
                InteractionRepository::new(pool.clone()),
            ),
            search_engine: SearchEngine::new(pool, limits),
            rate_limits: RateLimits::new(&config.rate_limit),
            config: Arc::new(config),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = middleware::cors::cors_layer_from_config(&state.config.cors);

    Router::new()
        .merge(create_routes(&state.rate_limits))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::optional_jwt_auth_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.rate_limits.api.clone(),
            middleware::rate_limit::rate_limit_middleware,
        ))
        .layer(cors)
        .layer(middleware::logging::logging_layer())
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr, shutdown_timeout: Duration) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let app = app.into_make_service_with_connect_info::<SocketAddr>();

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    // Graceful shutdown waits for in-flight requests; give up after the timeout.
    tokio::select! {
        result = server => result?,
        _ = async {
            shutdown_signal().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            error!("Graceful shutdown timed out after {:?}", shutdown_timeout);
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
