use std::sync::Arc;

use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::config::FormsConfig;
use crate::database::{TemplateRepository, TemplateRepositoryTrait};
use crate::error::{AppError, Result};
use crate::models::{Page, PopularTemplate, TagCount, Template};
use crate::search::query::SearchQuery;

#[derive(Clone)]
pub struct SearchEngine {
    pool: SqlitePool,
    templates: TemplateRepository,
    limits: Arc<FormsConfig>,
}

impl SearchEngine {
    pub fn new(pool: SqlitePool, limits: Arc<FormsConfig>) -> Self {
        Self {
            templates: TemplateRepository::new(pool.clone()),
            pool,
            limits,
        }
    }

    /// Active public templates matching the query, newest first.
    pub async fn search(&self, query: &SearchQuery) -> Result<Page<Template>> {
        debug!("Executing search query: {:?}", query);

        let filters = query.to_filters();
        let limit = self.limits.page_size(query.limit);
        let offset = query.offset();

        let items = self.templates.list(&filters, limit, offset).await?;
        let total_count = self.templates.count(&filters).await?;

        Ok(Page::new(items, total_count, offset, limit))
    }

    /// Tags across active public templates with how many templates use each.
    pub async fn popular_tags(&self, limit: Option<i64>) -> Result<Vec<TagCount>> {
        let rows = sqlx::query(
            r#"
            SELECT j.value as tag, COUNT(*) as count
            FROM templates t, json_each(t.tags) j
            WHERE t.status = 'active' AND t.is_public = 1
            GROUP BY j.value
            ORDER BY count DESC, tag ASC
            LIMIT ?
            "#,
        )
        .bind(self.limits.page_size(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<TagCount> {
                Ok(TagCount {
                    tag: row.try_get("tag")?,
                    count: row.try_get("count")?,
                })
            })
            .collect()
    }

    /// Active public templates ordered by how many responses they collected.
    pub async fn popular_templates(&self, limit: Option<i64>) -> Result<Vec<PopularTemplate>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.title, t.topic, u.username as author, COUNT(r.id) as response_count
            FROM templates t
            JOIN users u ON u.id = t.user_id
            LEFT JOIN responses r ON r.template_id = t.id
            WHERE t.status = 'active' AND t.is_public = 1
            GROUP BY t.id
            ORDER BY response_count DESC, t.created_at DESC
            LIMIT ?
            "#,
        )
        .bind(self.limits.page_size(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<PopularTemplate> {
                let id: String = row.try_get("id")?;
                let topic: String = row.try_get("topic")?;

                Ok(PopularTemplate {
                    id: id
                        .parse()
                        .map_err(|e| AppError::Database(format!("Invalid template id '{}': {}", id, e)))?,
                    title: row.try_get("title")?,
                    topic: topic.parse().map_err(AppError::Database)?,
                    author: row.try_get("author")?,
                    response_count: row.try_get("response_count")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{
        format_timestamp, get_memory_pool, run_migrations, ResponseRepository,
        ResponseRepositoryTrait,
    };
    use crate::models::{Question, QuestionKind, StoredResponse, TemplateStatus, Topic};
    use chrono::{Duration, Utc};
    use serde_json::Map;
    use uuid::Uuid;

    async fn setup() -> SearchEngine {
        let pool = get_memory_pool().await.unwrap();
        run_migrations(pool.clone()).await.unwrap();

        sqlx::query(
            "INSERT INTO users (username, email, password_hash, role, created_at) VALUES ('alice', 'alice@example.com', 'x', 'user', ?)",
        )
        .bind(format_timestamp(Utc::now()))
        .execute(&pool)
        .await
        .unwrap();

        SearchEngine::new(pool, Arc::new(FormsConfig::default()))
    }

    async fn insert(engine: &SearchEngine, title: &str, tags: &[&str], status: TemplateStatus, age: i64) -> Uuid {
        let created_at = Utc::now() - Duration::minutes(age);
        let template = Template {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            topic: Topic::Education,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            questions: vec![Question {
                id: "q1".to_string(),
                title: "Your name".to_string(),
                required: false,
                kind: QuestionKind::String,
            }],
            is_public: true,
            status,
            user_id: 1,
            created_at,
            updated_at: created_at,
        };
        engine.templates.insert(&template).await.unwrap();
        template.id
    }

    #[tokio::test]
    async fn test_search_matches_title_case_insensitively() {
        let engine = setup().await;
        insert(&engine, "Rust Basics", &["rust"], TemplateStatus::Active, 2).await;
        insert(&engine, "Advanced RUST", &["rust"], TemplateStatus::Active, 1).await;
        insert(&engine, "Cooking", &["food"], TemplateStatus::Active, 0).await;
        insert(&engine, "Rust draft", &["rust"], TemplateStatus::Pending, 0).await;

        let page = engine.search(&SearchQuery::new().with_text("rust")).await.unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.items[0].title, "Advanced RUST");
        assert_eq!(page.items[1].title, "Rust Basics");
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_wildcards_in_terms_match_literally() {
        let engine = setup().await;
        insert(&engine, "Rust Basics", &["rust"], TemplateStatus::Active, 1).await;
        insert(&engine, "Crab facts", &["rustacean"], TemplateStatus::Active, 0).await;
        insert(&engine, "100% sure", &["a_b"], TemplateStatus::Active, 0).await;

        let page = engine.search(&SearchQuery::new().with_tag("rust")).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].title, "Rust Basics");

        for wildcard in ["%", "_", "a%"] {
            let page = engine.search(&SearchQuery::new().with_tag(wildcard)).await.unwrap();
            assert_eq!(page.total_count, 0, "tag {:?}", wildcard);
        }

        let page = engine.search(&SearchQuery::new().with_text("%")).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].title, "100% sure");

        let page = engine.search(&SearchQuery::new().with_text("_")).await.unwrap();
        assert_eq!(page.total_count, 0);
    }

    #[tokio::test]
    async fn test_search_paginates() {
        let engine = setup().await;
        for i in 0..5 {
            insert(&engine, &format!("Survey {}", i), &[], TemplateStatus::Active, i).await;
        }

        let page = engine
            .search(&SearchQuery::new().with_pagination(0, 2))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_count, 5);
        assert!(page.has_more);

        let last = engine
            .search(&SearchQuery::new().with_pagination(4, 2))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_more);
    }

    #[tokio::test]
    async fn test_popular_tags_and_templates() {
        let engine = setup().await;
        let first = insert(&engine, "First", &["rust", "quiz"], TemplateStatus::Active, 2).await;
        insert(&engine, "Second", &["rust"], TemplateStatus::Active, 1).await;
        insert(&engine, "Hidden", &["secret"], TemplateStatus::Pending, 0).await;

        let tags = engine.popular_tags(None).await.unwrap();
        assert_eq!(tags[0].tag, "rust");
        assert_eq!(tags[0].count, 2);
        assert!(tags.iter().all(|t| t.tag != "secret"));

        let responses = ResponseRepository::new(engine.pool.clone());
        responses
            .insert(&StoredResponse {
                id: Uuid::new_v4(),
                template_id: first,
                user_id: None,
                answers: Map::new(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let popular = engine.popular_templates(Some(10)).await.unwrap();
        assert_eq!(popular.len(), 2);
        assert_eq!(popular[0].id, first);
        assert_eq!(popular[0].response_count, 1);
        assert_eq!(popular[0].author, "alice");
    }
}
