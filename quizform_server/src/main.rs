//! Main entry point for the QuizForm server binary

use std::{net::SocketAddr, time::Duration};

use anyhow::{Context, Result};
use quizform_core::{create_app, get_database_pool, run_migrations, run_server, AppConfig, AppState};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load().context("Failed to load configuration")?;

    info!("Configuration loaded successfully");
    info!("Server will bind to: {}", config.bind_address());
    info!("Database URL: {}", config.database.url);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("Invalid bind address")?;

    let pool = get_database_pool(&config.database)
        .await
        .context("Failed to create database pool")?;

    if config.database.migrate_on_start {
        run_migrations(pool.clone())
            .await
            .context("Failed to run database migrations")?;
    } else {
        warn!("Skipping migrations; the schema must already be current");
    }

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let auth_config = config.auth.clone();

    let state = AppState::new(config, pool).context("Failed to initialize application state")?;

    if state
        .auth_service
        .seed_admin(&auth_config)
        .await
        .context("Failed to seed admin account")?
    {
        info!("Admin account created from configuration");
    }

    info!("App: {} v{}", state.app_name, state.version);

    let app = create_app(state);
    run_server(app, addr, shutdown_timeout).await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };

        format!(
            "{}={},quizform_core={},tower_http=debug,sqlx=warn",
            env!("CARGO_CRATE_NAME"),
            default_level,
            default_level
        )
        .into()
    });

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty())
            .init();
    }
}
