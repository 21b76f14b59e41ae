//! Middleware components for the HTTP server

pub mod auth;
pub mod cors;
pub mod logging;
pub mod optional_auth;
pub mod rate_limit;

pub use auth::{optional_jwt_auth_middleware, require_admin, AuthUser};
pub use optional_auth::OptionalAuthUser;
pub use rate_limit::{rate_limit_middleware, RateLimiter, RateLimits};
