use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

pub const DEFAULT_JWT_SECRET: &str = "quizform-development-secret-change-me-0001";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub forms: FormsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout_seconds: u64,
    pub migrate_on_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub admin_username: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

/// Budget for the whole API. `auth` and `search` add stricter budgets on
/// the credential and search routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: u32,
    pub window_seconds: u64,
    pub auth: RateLimitRule,
    pub search: RateLimitRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRule {
    pub max_requests: u32,
    pub window_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// `*` allows any origin.
    pub allowed_origins: Vec<String>,
    pub max_age_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormsConfig {
    pub max_questions: usize,
    pub max_tags: usize,
    pub max_tag_length: usize,
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            shutdown_timeout_seconds: 10,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:./quizform.db".to_string(),
            max_connections: 10,
            connection_timeout_seconds: 30,
            migrate_on_start: true,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            access_token_minutes: 60,
            refresh_token_days: 7,
            admin_username: None,
            admin_email: None,
            admin_password: None,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_seconds: 15 * 60,
            auth: RateLimitRule {
                max_requests: 10,
                window_seconds: 60 * 60,
            },
            search: RateLimitRule {
                max_requests: 30,
                window_seconds: 5 * 60,
            },
        }
    }
}

impl RateLimitConfig {
    pub fn api(&self) -> RateLimitRule {
        RateLimitRule {
            max_requests: self.max_requests,
            window_seconds: self.window_seconds,
        }
    }
}

impl RateLimitRule {
    fn is_usable(&self) -> bool {
        self.max_requests > 0 && self.window_seconds > 0
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            max_age_seconds: 3600,
        }
    }
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            max_questions: 16,
            max_tags: 20,
            max_tag_length: 50,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl AuthConfig {
    /// Credentials for the bootstrap admin, when all three are configured.
    pub fn seed_admin(&self) -> Option<(&str, &str, &str)> {
        match (&self.admin_username, &self.admin_email, &self.admin_password) {
            (Some(username), Some(email), Some(password)) => {
                Some((username.as_str(), email.as_str(), password.as_str()))
            }
            _ => None,
        }
    }
}

impl FormsConfig {
    /// Clamp a requested page size into `1..=max_page_size`.
    pub fn page_size(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("cors.allowed_origins")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.database.url.is_empty() {
            return Err(ConfigError::Message(
                "Database URL cannot be empty".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "Database max connections must be greater than 0".to_string(),
            ));
        }

        if self.auth.jwt_secret.len() < 32 {
            return Err(ConfigError::Message(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        if self.auth.jwt_secret == DEFAULT_JWT_SECRET {
            tracing::warn!("Using default JWT secret - change this in production!");
        }

        if self.auth.access_token_minutes <= 0 || self.auth.refresh_token_days <= 0 {
            return Err(ConfigError::Message(
                "Token lifetimes must be positive".to_string(),
            ));
        }

        let limits = &self.rate_limit;
        for (scope, rule) in [("api", limits.api()), ("auth", limits.auth), ("search", limits.search)] {
            if limits.enabled && !rule.is_usable() {
                return Err(ConfigError::Message(format!(
                    "Rate limit '{}' needs a positive request budget and window",
                    scope
                )));
            }
        }

        if self.forms.max_questions == 0 || self.forms.max_tags == 0 {
            return Err(ConfigError::Message(
                "Form limits must be greater than 0".to_string(),
            ));
        }

        if self.forms.default_page_size <= 0 || self.forms.default_page_size > self.forms.max_page_size {
            return Err(ConfigError::Message(
                "Default page size must be between 1 and the max page size".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
