//! Row shapes and their conversion into domain models.
//!
//! Timestamps are stored as fixed-width RFC 3339 text (microseconds, `Z`)
//! so that ordering by the column is chronological.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Comment, StoredResponse, Template};

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Database(format!("Invalid timestamp '{}': {}", value, e)))
}

fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::Database(format!("Invalid id '{}': {}", value, e)))
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbTemplate {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub topic: String,
    pub tags: String,
    pub questions: String,
    pub is_public: bool,
    pub status: String,
    pub user_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<DbTemplate> for Template {
    type Error = AppError;

    fn try_from(row: DbTemplate) -> Result<Self> {
        Ok(Template {
            id: parse_uuid(&row.id)?,
            title: row.title,
            description: row.description,
            topic: row.topic.parse().map_err(AppError::Database)?,
            tags: serde_json::from_str(&row.tags)
                .map_err(|e| AppError::Database(format!("Invalid tags column: {}", e)))?,
            questions: serde_json::from_str(&row.questions)
                .map_err(|e| AppError::Database(format!("Invalid questions column: {}", e)))?,
            is_public: row.is_public,
            status: row.status.parse().map_err(AppError::Database)?,
            user_id: row.user_id,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbResponse {
    pub id: String,
    pub template_id: String,
    pub user_id: Option<i64>,
    pub answers: String,
    pub created_at: String,
}

impl TryFrom<DbResponse> for StoredResponse {
    type Error = AppError;

    fn try_from(row: DbResponse) -> Result<Self> {
        Ok(StoredResponse {
            id: parse_uuid(&row.id)?,
            template_id: parse_uuid(&row.template_id)?,
            user_id: row.user_id,
            answers: serde_json::from_str(&row.answers)
                .map_err(|e| AppError::Database(format!("Invalid answers column: {}", e)))?,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbComment {
    pub id: String,
    pub template_id: String,
    pub user_id: i64,
    pub author: String,
    pub content: String,
    pub created_at: String,
}

impl TryFrom<DbComment> for Comment {
    type Error = AppError;

    fn try_from(row: DbComment) -> Result<Self> {
        Ok(Comment {
            id: parse_uuid(&row.id)?,
            template_id: parse_uuid(&row.template_id)?,
            user_id: row.user_id,
            author: row.author,
            content: row.content,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_timestamp_roundtrip_and_width() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let formatted = format_timestamp(ts);

        assert_eq!(formatted, "2024-05-01T12:00:00.000000Z");
        assert_eq!(parse_timestamp(&formatted).unwrap(), ts);
    }

    #[test]
    fn test_timestamps_sort_lexically() {
        let earlier = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let later = earlier + Duration::microseconds(1500);

        assert!(format_timestamp(earlier) < format_timestamp(later));
    }

    #[test]
    fn test_bad_template_row_is_a_database_error() {
        let row = DbTemplate {
            id: "not-a-uuid".to_string(),
            title: "Broken".to_string(),
            description: None,
            topic: "Quiz".to_string(),
            tags: "[]".to_string(),
            questions: "[]".to_string(),
            is_public: true,
            status: "active".to_string(),
            user_id: 1,
            created_at: format_timestamp(Utc::now()),
            updated_at: format_timestamp(Utc::now()),
        };

        assert!(matches!(Template::try_from(row), Err(AppError::Database(_))));
    }
}
