use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{error::AppError, middleware::auth::AuthUser};

/// The caller if one authenticated, for routes that also serve anonymous users.
pub struct OptionalAuthUser(pub Option<AuthUser>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_user = parts.extensions.get::<AuthUser>().cloned();
        Ok(OptionalAuthUser(auth_user))
    }
}
