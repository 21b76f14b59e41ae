#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    Router,
};
use quizform_core::{
    config::AuthConfig,
    create_app,
    database::{get_memory_pool, run_migrations},
    AppConfig, AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const PASSWORD: &str = "Password123";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let pool = get_memory_pool().await.unwrap();
        run_migrations(pool.clone()).await.unwrap();

        let state = AppState::new(config, pool).unwrap();
        let app = create_app(state.clone());

        Self { app, state }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request_from(None, method, uri, token, body).await
    }

    /// Like [`TestApp::request`], but as if it arrived over a connection
    /// from `client`, which is what the rate limiters key on.
    pub async fn request_from(
        &self,
        client: Option<SocketAddr>,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(client) = client {
            builder = builder.extension(ConnectInfo(client));
        }

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Registers `username` and returns an access token.
    pub async fn user_token(&self, username: &str) -> String {
        let (status, _) = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        self.login(username).await
    }

    pub async fn login(&self, username: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/login",
                None,
                json!({ "username": username, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        body["access_token"].as_str().unwrap().to_string()
    }

    /// Seeds the admin account and returns its access token.
    pub async fn admin_token(&self) -> String {
        let config = AuthConfig {
            admin_username: Some("admin".to_string()),
            admin_email: Some("admin@example.com".to_string()),
            admin_password: Some(PASSWORD.to_string()),
            ..AuthConfig::default()
        };
        self.state.auth_service.seed_admin(&config).await.unwrap();

        self.login("admin").await
    }

    /// Creates a template as `token` and returns its id.
    pub async fn create_template(&self, token: &str, body: Value) -> String {
        let (status, created) = self.post("/api/templates", Some(token), body).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", created);

        created["id"].as_str().unwrap().to_string()
    }

    pub async fn approve(&self, admin_token: &str, id: &str) {
        let (status, body) = self
            .post(&format!("/api/templates/{}/approve", id), Some(admin_token), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK, "approve failed: {}", body);
    }
}

/// A template with one question of each interesting kind.
pub fn survey_template(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Tell us about yourself",
        "topic": "Quiz",
        "tags": ["survey", "rust"],
        "questions": [
            { "id": "name", "title": "Your name", "type": "string", "required": true },
            { "id": "age", "title": "Your age", "type": "number", "min": 1, "max": 120 },
            { "id": "email", "title": "Email address", "type": "email" },
            { "id": "color", "title": "Favourite colour", "type": "radio", "options": ["red", "green"] },
            { "id": "agree", "title": "Accept terms", "type": "checkbox", "required": true }
        ]
    })
}
