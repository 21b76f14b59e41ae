use quizform_core::{
    config::DatabaseConfig,
    get_database_pool,
    middleware::AuthUser,
    models::{TemplateInput, TemplateStatus},
    run_migrations, AppConfig, AppState,
};
use serde_json::json;
use tempfile::NamedTempFile;

fn file_config(file: &NamedTempFile) -> DatabaseConfig {
    DatabaseConfig {
        url: format!("sqlite:{}", file.path().display()),
        max_connections: 4,
        connection_timeout_seconds: 5,
        migrate_on_start: true,
    }
}

fn input() -> TemplateInput {
    serde_json::from_value(json!({
        "title": "Persisted",
        "topic": "Education",
        "tags": ["durable"],
        "questions": [
            { "id": "q1", "title": "Favourite day", "type": "date", "min": "2024-01-01" }
        ]
    }))
    .unwrap()
}

#[tokio::test]
async fn test_data_survives_reopening_the_file() {
    let file = NamedTempFile::new().unwrap();
    let config = file_config(&file);

    let pool = get_database_pool(&config).await.unwrap();
    run_migrations(pool.clone()).await.unwrap();

    let state = AppState::new(AppConfig::default(), pool.clone()).unwrap();
    let user = state
        .auth_service
        .register(
            serde_json::from_value(json!({
                "username": "writer",
                "email": "writer@example.com",
                "password": "Password123"
            }))
            .unwrap(),
        )
        .await
        .unwrap();

    let author = AuthUser::new(user.id, user.username.clone(), user.role);
    let created = state.template_service.create(&author, input()).await.unwrap();
    pool.close().await;

    let pool = get_database_pool(&config).await.unwrap();
    // Running migrations again on an existing schema is a no-op.
    run_migrations(pool.clone()).await.unwrap();

    let state = AppState::new(AppConfig::default(), pool).unwrap();
    let detail = state
        .template_service
        .get(created.id, Some(&author))
        .await
        .unwrap();

    assert_eq!(detail.template.title, "Persisted");
    assert_eq!(detail.template.status, TemplateStatus::Pending);
    assert_eq!(detail.template.questions, created.questions);
    assert_eq!(detail.author, "writer");

    let stats = state.db_manager.get_stats().await.unwrap();
    assert_eq!(stats.template_count, 1);
    assert_eq!(stats.user_count, 1);
    assert_eq!(stats.response_count, 0);
}
