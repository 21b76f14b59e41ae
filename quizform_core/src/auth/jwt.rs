use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::models::{JwtClaims, TokenType, User};
use crate::config::AuthConfig;
use crate::error::AppError;

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry: Duration,
    refresh_token_expiry: Duration,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        if config.jwt_secret.len() < 32 {
            return Err(AppError::Authentication(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        let secret = config.jwt_secret.as_bytes();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_token_expiry: Duration::minutes(config.access_token_minutes),
            refresh_token_expiry: Duration::days(config.refresh_token_days),
        })
    }

    pub fn generate_access_token(&self, user: &User) -> Result<String, AppError> {
        self.generate_token(user, TokenType::Access, self.access_token_expiry)
    }

    pub fn generate_refresh_token(&self, user: &User) -> Result<String, AppError> {
        self.generate_token(user, TokenType::Refresh, self.refresh_token_expiry)
    }

    fn generate_token(&self, user: &User, token_type: TokenType, lifetime: Duration) -> Result<String, AppError> {
        let now = Utc::now();

        let claims = JwtClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            exp: (now + lifetime).timestamp() as usize,
            iat: now.timestamp() as usize,
            token_type,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Authentication(format!("Failed to generate token: {}", e)))
    }

    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AppError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Authentication("Token has expired".to_string())
                }
                _ => AppError::Authentication("Invalid token".to_string()),
            })
    }

    pub fn validate_access_token(&self, token: &str) -> Result<JwtClaims, AppError> {
        self.validate_typed(token, TokenType::Access)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<JwtClaims, AppError> {
        self.validate_typed(token, TokenType::Refresh)
    }

    fn validate_typed(&self, token: &str, expected: TokenType) -> Result<JwtClaims, AppError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != expected {
            return Err(AppError::Authentication("Invalid token type".to_string()));
        }

        Ok(claims)
    }

    pub fn get_access_token_expiry_seconds(&self) -> i64 {
        self.access_token_expiry.num_seconds()
    }

    pub fn user_id(claims: &JwtClaims) -> Result<i64, AppError> {
        claims
            .sub
            .parse()
            .map_err(|_| AppError::Authentication("Invalid user ID in token".to_string()))
    }
}
