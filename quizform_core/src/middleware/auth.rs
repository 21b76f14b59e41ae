use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::models::{User, UserRole};
use crate::error::AppError;
use crate::AppState;

/// The caller resolved from a bearer token. Extracting it directly makes the
/// route require authentication.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn new(user_id: i64, username: String, role: UserRole) -> Self {
        Self {
            user_id,
            username,
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    /// Owner of the resource or an admin.
    pub fn can_manage(&self, owner_id: i64) -> bool {
        self.is_admin() || self.user_id == owner_id
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self::new(user.id, user.username, user.role)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Authentication("Authentication required".to_string()))
    }
}

/// Attaches an [`AuthUser`] to every request carrying a valid bearer token.
/// Requests without one, or with a stale one, continue anonymously.
pub async fn optional_jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Ok(token) = extract_token_from_header(request.headers()) {
        match state.auth_service.authenticate(&token).await {
            Ok(user) => {
                request.extensions_mut().insert(AuthUser::from(user));
            }
            Err(e) => debug!("ignoring bearer token: {}", e),
        }
    }

    next.run(request).await
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| AppError::Authentication("Authentication required".to_string()))?;

    if !auth_user.is_admin() {
        return Err(AppError::Authorization("Admin access required".to_string()));
    }

    Ok(next.run(request).await)
}

fn extract_token_from_header(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Authentication("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Authentication("Invalid Authorization header format".to_string()))?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Authentication("Authorization header must start with 'Bearer '".to_string())
    })?;

    if token.is_empty() {
        return Err(AppError::Authentication("Empty token".to_string()));
    }

    Ok(token.to_string())
}
