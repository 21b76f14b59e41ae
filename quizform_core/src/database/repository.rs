use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::database::models::{format_timestamp, parse_timestamp, DbComment, DbResponse, DbTemplate};
use crate::error::{AppError, Result};
use crate::models::{
    Comment, LikeStatus, StoredResponse, Template, TemplateStatus, UserResponseSummary,
};
use crate::search::filters::{SqlParam, TemplateFilters};

const TEMPLATE_COLUMNS: &str = "t.id, t.title, t.description, t.topic, t.tags, t.questions, \
     t.is_public, t.status, t.user_id, t.created_at, t.updated_at";

/// Author name and engagement counts for one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateStats {
    pub author: String,
    pub likes: i64,
    pub response_count: i64,
}

#[async_trait]
pub trait TemplateRepositoryTrait {
    async fn insert(&self, template: &Template) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Template>>;
    async fn update(&self, template: &Template) -> Result<()>;
    async fn set_status(&self, id: Uuid, status: TemplateStatus) -> Result<bool>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn list(&self, filters: &TemplateFilters, limit: i64, offset: i64) -> Result<Vec<Template>>;
    async fn count(&self, filters: &TemplateFilters) -> Result<i64>;
    async fn stats(&self, id: Uuid) -> Result<TemplateStats>;
}

#[async_trait]
pub trait ResponseRepositoryTrait {
    async fn insert(&self, response: &StoredResponse) -> Result<()>;
    async fn list_for_template(&self, template_id: Uuid) -> Result<Vec<StoredResponse>>;
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<UserResponseSummary>>;
}

#[derive(Clone)]
pub struct TemplateRepository {
    pool: SqlitePool,
}

impl TemplateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateRepositoryTrait for TemplateRepository {
    async fn insert(&self, template: &Template) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO templates
                (id, title, description, topic, tags, questions, is_public, status, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(template.id.to_string())
        .bind(&template.title)
        .bind(&template.description)
        .bind(template.topic.as_str())
        .bind(serde_json::to_string(&template.tags)?)
        .bind(serde_json::to_string(&template.questions)?)
        .bind(template.is_public)
        .bind(template.status.as_str())
        .bind(template.user_id)
        .bind(format_timestamp(template.created_at))
        .bind(format_timestamp(template.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Template>> {
        let sql = format!("SELECT {} FROM templates t WHERE t.id = ?", TEMPLATE_COLUMNS);

        let row = sqlx::query_as::<_, DbTemplate>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Template::try_from).transpose()
    }

    async fn update(&self, template: &Template) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE templates
            SET title = ?, description = ?, topic = ?, tags = ?, questions = ?, is_public = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&template.title)
        .bind(&template.description)
        .bind(template.topic.as_str())
        .bind(serde_json::to_string(&template.tags)?)
        .bind(serde_json::to_string(&template.questions)?)
        .bind(template.is_public)
        .bind(format_timestamp(template.updated_at))
        .bind(template.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Template not found".to_string()));
        }

        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: TemplateStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE templates SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(format_timestamp(Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM templates WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filters: &TemplateFilters, limit: i64, offset: i64) -> Result<Vec<Template>> {
        let (where_clause, params) = filters.build_where_clause();
        let sql = format!(
            r#"
            SELECT {}
            FROM templates t
            JOIN users u ON u.id = t.user_id
            {}
            ORDER BY t.created_at DESC, t.rowid DESC
            LIMIT ? OFFSET ?
            "#,
            TEMPLATE_COLUMNS, where_clause
        );

        let mut query = sqlx::query_as::<_, DbTemplate>(&sql);
        for param in &params {
            query = match param {
                SqlParam::Text(value) => query.bind(value),
                SqlParam::Int(value) => query.bind(*value),
            };
        }

        let rows = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Template::try_from).collect()
    }

    async fn count(&self, filters: &TemplateFilters) -> Result<i64> {
        let (where_clause, params) = filters.build_where_clause();
        let sql = format!(
            "SELECT COUNT(*) as total FROM templates t JOIN users u ON u.id = t.user_id {}",
            where_clause
        );

        let mut query = sqlx::query(&sql);
        for param in &params {
            query = match param {
                SqlParam::Text(value) => query.bind(value),
                SqlParam::Int(value) => query.bind(*value),
            };
        }

        let row = query.fetch_one(&self.pool).await?;
        Ok(row.try_get("total")?)
    }

    async fn stats(&self, id: Uuid) -> Result<TemplateStats> {
        let row = sqlx::query(
            r#"
            SELECT
                u.username as author,
                (SELECT COUNT(*) FROM likes l WHERE l.template_id = t.id) as likes,
                (SELECT COUNT(*) FROM responses r WHERE r.template_id = t.id) as response_count
            FROM templates t
            JOIN users u ON u.id = t.user_id
            WHERE t.id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;

        Ok(TemplateStats {
            author: row.try_get("author")?,
            likes: row.try_get("likes")?,
            response_count: row.try_get("response_count")?,
        })
    }
}

#[derive(Clone)]
pub struct ResponseRepository {
    pool: SqlitePool,
}

impl ResponseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResponseRepositoryTrait for ResponseRepository {
    async fn insert(&self, response: &StoredResponse) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO responses (id, template_id, user_id, answers, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(response.id.to_string())
        .bind(response.template_id.to_string())
        .bind(response.user_id)
        .bind(serde_json::to_string(&response.answers)?)
        .bind(format_timestamp(response.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_template(&self, template_id: Uuid) -> Result<Vec<StoredResponse>> {
        let rows = sqlx::query_as::<_, DbResponse>(
            r#"
            SELECT id, template_id, user_id, answers, created_at
            FROM responses
            WHERE template_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(template_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StoredResponse::try_from).collect()
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<UserResponseSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.template_id, t.title, r.created_at
            FROM responses r
            JOIN templates t ON t.id = r.template_id
            WHERE r.user_id = ?
            ORDER BY r.created_at DESC, r.rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<UserResponseSummary> {
                let id: String = row.try_get("id")?;
                let template_id: String = row.try_get("template_id")?;
                let created_at: String = row.try_get("created_at")?;

                Ok(UserResponseSummary {
                    id: parse_id(&id)?,
                    template_id: parse_id(&template_id)?,
                    template_title: row.try_get("title")?,
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct InteractionRepository {
    pool: SqlitePool,
}

impl InteractionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add the like if absent, remove it if present.
    pub async fn toggle_like(&self, template_id: Uuid, user_id: i64) -> Result<LikeStatus> {
        let mut tx = self.pool.begin().await?;
        let template_id = template_id.to_string();

        let removed = sqlx::query("DELETE FROM likes WHERE template_id = ? AND user_id = ?")
            .bind(&template_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            sqlx::query("INSERT INTO likes (template_id, user_id, created_at) VALUES (?, ?, ?)")
                .bind(&template_id)
                .bind(user_id)
                .bind(format_timestamp(Utc::now()))
                .execute(&mut *tx)
                .await?;
        }

        let row = sqlx::query("SELECT COUNT(*) as likes FROM likes WHERE template_id = ?")
            .bind(&template_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(LikeStatus {
            liked: removed == 0,
            likes: row.try_get("likes")?,
        })
    }

    pub async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        sqlx::query(
            "INSERT INTO comments (id, template_id, user_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(comment.id.to_string())
        .bind(comment.template_id.to_string())
        .bind(comment.user_id)
        .bind(&comment.content)
        .bind(format_timestamp(comment.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_comments(&self, template_id: Uuid) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, DbComment>(
            r#"
            SELECT c.id, c.template_id, c.user_id, u.username as author, c.content, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.template_id = ?
            ORDER BY c.created_at ASC, c.rowid ASC
            "#,
        )
        .bind(template_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Comment::try_from).collect()
    }

    pub async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        let row = sqlx::query_as::<_, DbComment>(
            r#"
            SELECT c.id, c.template_id, c.user_id, u.username as author, c.content, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Comment::try_from).transpose()
    }

    pub async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn parse_id(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::Database(format!("Invalid id '{}': {}", value, e)))
}
