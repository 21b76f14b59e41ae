use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::jwt::JwtService;
use crate::auth::models::{
    ChangePasswordRequest, JwtClaims, LoginRequest, LoginResponse, RefreshTokenResponse,
    RegisterRequest, UpdateProfileRequest, User, UserResponse, UserRole,
};
use crate::auth::repository::{UserRepository, UserRepositoryTrait};
use crate::config::AuthConfig;
use crate::error::AppError;
use crate::validation::ValidationResult;

#[derive(Clone)]
pub struct AuthService {
    user_repository: Arc<dyn UserRepositoryTrait + Send + Sync>,
    jwt_service: Arc<JwtService>,
    argon2: Argon2<'static>,
}

impl AuthService {
    pub fn new(user_repository: UserRepository, jwt_service: JwtService) -> Self {
        Self {
            user_repository: Arc::new(user_repository),
            jwt_service: Arc::new(jwt_service),
            argon2: Argon2::default(),
        }
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AppError> {
        request.validate().map_err(|errors| {
            AppError::InvalidInput(ValidationResult::from_validation_errors(errors))
        })?;

        let username = request.username.trim();
        let email = request.email.trim().to_lowercase();

        if self.user_repository.get_user_by_username(username).await?.is_some() {
            return Err(AppError::BadRequest("Username already exists".to_string()));
        }

        if self.user_repository.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::BadRequest("Email already exists".to_string()));
        }

        let password_hash = self.hash_password(&request.password)?;
        let user = self
            .user_repository
            .create_user(username, &email, &password_hash, UserRole::User)
            .await?;

        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(UserResponse::from(user))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        request.validate().map_err(|errors| {
            AppError::InvalidInput(ValidationResult::from_validation_errors(errors))
        })?;

        let identifier = request.username.trim();
        let user = match self.user_repository.get_user_by_username(identifier).await? {
            Some(user) => Some(user),
            None if identifier.contains('@') => {
                self.user_repository
                    .get_user_by_email(&identifier.to_lowercase())
                    .await?
            }
            None => None,
        }
        .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        if !self.verify_password(&request.password, &user.password_hash)? {
            warn!(username = %identifier, "login rejected: bad credentials");
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        if !user.is_active {
            warn!(user_id = user.id, "login rejected: account blocked");
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        self.user_repository.update_last_login(user.id).await?;

        let access_token = self.jwt_service.generate_access_token(&user)?;
        let refresh_token = self.jwt_service.generate_refresh_token(&user)?;

        info!(user_id = user.id, "user logged in");
        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.get_access_token_expiry_seconds(),
            user: UserResponse::from(user),
        })
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshTokenResponse, AppError> {
        let claims = self.jwt_service.validate_refresh_token(refresh_token)?;
        let user = self.active_user(&claims).await?;

        let access_token = self.jwt_service.generate_access_token(&user)?;

        Ok(RefreshTokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.get_access_token_expiry_seconds(),
        })
    }

    /// Resolves an access token to its account. Blocked accounts are
    /// rejected immediately and the role is read from storage, not the token.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = self.jwt_service.validate_access_token(token)?;
        self.active_user(&claims).await
    }

    async fn active_user(&self, claims: &JwtClaims) -> Result<User, AppError> {
        let user_id = JwtService::user_id(claims)?;

        let user = self
            .user_repository
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Authentication("User not found".to_string()))?;

        if !user.is_active {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        Ok(user)
    }

    pub async fn get_user_by_id(&self, user_id: i64) -> Result<Option<UserResponse>, AppError> {
        let user = self.user_repository.get_user_by_id(user_id).await?;
        Ok(user.map(UserResponse::from))
    }

    /// Changes the caller's username and email. Both stay unique.
    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> Result<UserResponse, AppError> {
        request.validate().map_err(|errors| {
            AppError::InvalidInput(ValidationResult::from_validation_errors(errors))
        })?;

        let mut user = self.existing_user(user_id).await?;
        let username = request.username.trim();
        let email = request.email.trim().to_lowercase();

        if username != user.username {
            if let Some(other) = self.user_repository.get_user_by_username(username).await? {
                if other.id != user_id {
                    return Err(AppError::BadRequest("Username already exists".to_string()));
                }
            }
        }

        if email != user.email {
            if let Some(other) = self.user_repository.get_user_by_email(&email).await? {
                if other.id != user_id {
                    return Err(AppError::BadRequest("Email already exists".to_string()));
                }
            }
        }

        self.user_repository
            .update_profile(user_id, username, &email)
            .await?;

        user.username = username.to_string();
        user.email = email;

        info!(user_id, "profile updated");
        Ok(UserResponse::from(user))
    }

    /// Replaces the caller's password after checking the current one.
    /// Issued tokens stay valid.
    pub async fn change_password(
        &self,
        user_id: i64,
        request: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        request.validate().map_err(|errors| {
            AppError::InvalidInput(ValidationResult::from_validation_errors(errors))
        })?;

        let user = self.existing_user(user_id).await?;

        if !self.verify_password(&request.current_password, &user.password_hash)? {
            warn!(user_id, "password change rejected: wrong current password");
            return Err(AppError::BadRequest("Current password is incorrect".to_string()));
        }

        if request.current_password == request.new_password {
            return Err(AppError::BadRequest(
                "New password must differ from the current one".to_string(),
            ));
        }

        let password_hash = self.hash_password(&request.new_password)?;
        self.user_repository
            .update_password(user_id, &password_hash)
            .await?;

        info!(user_id, "password changed");
        Ok(())
    }

    async fn existing_user(&self, user_id: i64) -> Result<User, AppError> {
        self.user_repository
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<UserResponse>, AppError> {
        let users = self.user_repository.list_users(limit, offset).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Blocks or unblocks `target_id`.
    pub async fn toggle_status(&self, admin_id: i64, target_id: i64) -> Result<UserResponse, AppError> {
        let mut target = self.admin_target(admin_id, target_id, "status").await?;

        target.is_active = !target.is_active;
        self.user_repository
            .update_user_status(target.id, target.is_active)
            .await?;

        info!(admin_id, target_id, is_active = target.is_active, "user status toggled");
        Ok(UserResponse::from(target))
    }

    pub async fn toggle_role(&self, admin_id: i64, target_id: i64) -> Result<UserResponse, AppError> {
        let mut target = self.admin_target(admin_id, target_id, "role").await?;

        target.role = target.role.toggled();
        self.user_repository.update_user_role(target.id, target.role).await?;

        info!(admin_id, target_id, role = %target.role, "user role toggled");
        Ok(UserResponse::from(target))
    }

    async fn admin_target(&self, admin_id: i64, target_id: i64, what: &str) -> Result<User, AppError> {
        if admin_id == target_id {
            return Err(AppError::BadRequest(format!("Cannot change your own {}", what)));
        }

        self.user_repository
            .get_user_by_id(target_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", target_id)))
    }

    /// Creates the configured admin account unless an admin already exists.
    /// Returns whether an account was created.
    pub async fn seed_admin(&self, config: &AuthConfig) -> Result<bool, AppError> {
        let Some((username, email, password)) = config.seed_admin() else {
            return Ok(false);
        };

        if self.user_repository.count_admins().await? > 0 {
            return Ok(false);
        }

        let password_hash = self.hash_password(password)?;
        let user = self
            .user_repository
            .create_user(username, &email.to_lowercase(), &password_hash, UserRole::Admin)
            .await?;

        info!(user_id = user.id, username = %user.username, "seeded admin account");
        Ok(true)
    }

    fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Other(anyhow::anyhow!("Failed to hash password: {}", e)))?;

        Ok(password_hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Other(anyhow::anyhow!("Invalid password hash: {}", e)))?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
