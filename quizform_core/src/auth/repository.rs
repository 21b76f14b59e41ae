use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::auth::models::{User, UserRole};
use crate::database::models::{format_timestamp, parse_timestamp};
use crate::error::AppError;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at, last_login, is_active";

#[async_trait]
pub trait UserRepositoryTrait {
    async fn create_user(&self, username: &str, email: &str, password_hash: &str, role: UserRole) -> Result<User, AppError>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn update_last_login(&self, user_id: i64) -> Result<(), AppError>;
    async fn update_user_status(&self, user_id: i64, is_active: bool) -> Result<(), AppError>;
    async fn update_user_role(&self, user_id: i64, role: UserRole) -> Result<(), AppError>;
    async fn update_profile(&self, user_id: i64, username: &str, email: &str) -> Result<(), AppError>;
    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), AppError>;
    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError>;
    async fn count_admins(&self) -> Result<i64, AppError>;
}

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column);

        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user by {}: {}", column, e)))?;

        row.as_ref().map(user_from_row).transpose()
    }
}

fn unique_violation(e: sqlx::Error, action: &str) -> AppError {
    let message = e.to_string();

    if message.contains("UNIQUE constraint failed") {
        if message.contains("username") {
            AppError::BadRequest("Username already exists".to_string())
        } else if message.contains("email") {
            AppError::BadRequest("Email already exists".to_string())
        } else {
            AppError::BadRequest("User already exists".to_string())
        }
    } else {
        AppError::Database(format!("Failed to {}: {}", action, message))
    }
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, AppError> {
    let created_at: String = row.try_get("created_at")?;
    let last_login: Option<String> = row.try_get("last_login")?;
    let role: String = row.try_get("role")?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: role.parse().map_err(AppError::Database)?,
        created_at: parse_timestamp(&created_at)?,
        last_login: last_login.as_deref().map(parse_timestamp).transpose()?,
        is_active: row.try_get("is_active")?,
    })
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn create_user(&self, username: &str, email: &str, password_hash: &str, role: UserRole) -> Result<User, AppError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, role, created_at, is_active)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role.to_string())
        .bind(format_timestamp(now))
        .bind(true)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "create user"))?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: now,
            last_login: None,
            is_active: true,
        })
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user by ID: {}", e)))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.fetch_one_by("username", username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.fetch_one_by("email", email).await
    }

    async fn update_last_login(&self, user_id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(format_timestamp(Utc::now()))
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update last login: {}", e)))?;

        Ok(())
    }

    async fn update_user_status(&self, user_id: i64, is_active: bool) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update user status: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    async fn update_user_role(&self, user_id: i64, role: UserRole) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role.to_string())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update user role: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    async fn update_profile(&self, user_id: i64, username: &str, email: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET username = ?, email = ? WHERE id = ?")
            .bind(username)
            .bind(email)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| unique_violation(e, "update profile"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update password: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            USER_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list users: {}", e)))?;

        rows.iter().map(user_from_row).collect()
    }

    async fn count_admins(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM users WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to count admins: {}", e)))?;

        Ok(row.try_get("count")?)
    }
}
