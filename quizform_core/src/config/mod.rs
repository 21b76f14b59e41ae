pub mod settings;

pub use settings::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, FormsConfig, RateLimitConfig, RateLimitRule,
    ServerConfig,
};
