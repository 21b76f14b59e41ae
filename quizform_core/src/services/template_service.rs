use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::FormsConfig;
use crate::database::{
    ResponseRepository, ResponseRepositoryTrait, TemplateRepository, TemplateRepositoryTrait,
};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    Page, PaginationQuery, StoredResponse, Template, TemplateDetail, TemplateInput,
    TemplateStatus, UserResponseSummary,
};
use crate::search::TemplateFilters;
use crate::validation::TemplateValidator;

/// Whether `viewer` may see `template` at all. Active public templates are
/// visible to everyone, anything else only to its owner and admins.
pub fn can_view(template: &Template, viewer: Option<&AuthUser>) -> bool {
    (template.is_active() && template.is_public)
        || viewer.map_or(false, |user| user.can_manage(template.user_id))
}

#[derive(Clone)]
pub struct TemplateService {
    templates: Arc<dyn TemplateRepositoryTrait + Send + Sync>,
    responses: Arc<dyn ResponseRepositoryTrait + Send + Sync>,
    limits: Arc<FormsConfig>,
}

impl TemplateService {
    pub fn new(
        templates: TemplateRepository,
        responses: ResponseRepository,
        limits: Arc<FormsConfig>,
    ) -> Self {
        Self {
            templates: Arc::new(templates),
            responses: Arc::new(responses),
            limits,
        }
    }

    /// Creates a `pending` template owned by `author`.
    pub async fn create(&self, author: &AuthUser, input: TemplateInput) -> Result<Template> {
        let input = self.prepare(input)?;
        let now = Utc::now();

        let template = Template {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            topic: input.topic,
            tags: input.tags,
            questions: input.questions,
            is_public: input.is_public,
            status: TemplateStatus::Pending,
            user_id: author.user_id,
            created_at: now,
            updated_at: now,
        };

        self.templates.insert(&template).await?;

        info!(template_id = %template.id, user_id = author.user_id, "template created");
        Ok(template)
    }

    pub async fn get(&self, id: Uuid, viewer: Option<&AuthUser>) -> Result<TemplateDetail> {
        let template = self.find(id).await?;

        if !can_view(&template, viewer) {
            return Err(not_found(id));
        }

        let stats = self.templates.stats(id).await?;

        Ok(TemplateDetail {
            template,
            author: stats.author,
            likes: stats.likes,
            response_count: stats.response_count,
        })
    }

    /// Active public templates, newest first.
    pub async fn list(&self, pagination: &PaginationQuery) -> Result<Page<Template>> {
        self.page(&TemplateFilters::browsable(), pagination).await
    }

    /// Every template of one owner, whatever its status.
    pub async fn list_for_owner(&self, user_id: i64, pagination: &PaginationQuery) -> Result<Page<Template>> {
        self.page(&TemplateFilters::new().with_user_id(user_id), pagination)
            .await
    }

    /// Every template, optionally restricted to one status.
    pub async fn list_all(
        &self,
        status: Option<TemplateStatus>,
        pagination: &PaginationQuery,
    ) -> Result<Page<Template>> {
        let mut filters = TemplateFilters::new();
        if let Some(status) = status {
            filters = filters.with_status(status);
        }
        self.page(&filters, pagination).await
    }

    async fn page(&self, filters: &TemplateFilters, pagination: &PaginationQuery) -> Result<Page<Template>> {
        let limit = self.limits.page_size(pagination.limit);
        let offset = pagination.offset();

        let items = self.templates.list(filters, limit, offset).await?;
        let total_count = self.templates.count(filters).await?;

        Ok(Page::new(items, total_count, offset, limit))
    }

    /// Replaces the definition. The status is left as it was.
    pub async fn update(&self, id: Uuid, user: &AuthUser, input: TemplateInput) -> Result<Template> {
        let mut template = self.find_managed(id, user).await?;
        let input = self.prepare(input)?;

        template.title = input.title;
        template.description = input.description;
        template.topic = input.topic;
        template.tags = input.tags;
        template.questions = input.questions;
        template.is_public = input.is_public;
        template.updated_at = Utc::now();

        self.templates.update(&template).await?;

        info!(template_id = %id, user_id = user.user_id, "template updated");
        Ok(template)
    }

    pub async fn archive(&self, id: Uuid, user: &AuthUser) -> Result<Template> {
        let template = self.find_managed(id, user).await?;
        self.change_status(template, TemplateStatus::Archived).await
    }

    pub async fn approve(&self, id: Uuid) -> Result<Template> {
        let template = self.find(id).await?;
        self.change_status(template, TemplateStatus::Active).await
    }

    async fn change_status(&self, mut template: Template, status: TemplateStatus) -> Result<Template> {
        if !self.templates.set_status(template.id, status).await? {
            return Err(not_found(template.id));
        }

        info!(template_id = %template.id, from = %template.status, to = %status, "template status changed");
        template.status = status;
        Ok(template)
    }

    /// Removes the template together with its responses, likes and comments.
    pub async fn delete(&self, id: Uuid, user: &AuthUser) -> Result<()> {
        self.find_managed(id, user).await?;

        if !self.templates.delete(id).await? {
            return Err(not_found(id));
        }

        info!(template_id = %id, user_id = user.user_id, "template deleted");
        Ok(())
    }

    /// Responses collected by a template, newest first.
    pub async fn list_responses(&self, id: Uuid, user: &AuthUser) -> Result<Vec<StoredResponse>> {
        self.find_managed(id, user).await?;
        self.responses.list_for_template(id).await
    }

    pub async fn responses_by_user(&self, user_id: i64) -> Result<Vec<UserResponseSummary>> {
        self.responses.list_for_user(user_id).await
    }

    async fn find(&self, id: Uuid) -> Result<Template> {
        self.templates.get(id).await?.ok_or_else(|| not_found(id))
    }

    /// Loads a template `user` may change. Callers who cannot even see it
    /// get 404, visible ones they do not own get 403.
    async fn find_managed(&self, id: Uuid, user: &AuthUser) -> Result<Template> {
        let template = self.find(id).await?;

        if user.can_manage(template.user_id) {
            return Ok(template);
        }

        if !can_view(&template, Some(user)) {
            return Err(not_found(id));
        }

        warn!(template_id = %id, user_id = user.user_id, "template change refused");
        Err(AppError::Authorization(
            "Only the owner or an admin can change this template".to_string(),
        ))
    }

    /// Trims text, drops blank and repeated tags, assigns ids to questions
    /// that came without one, then checks the definition.
    fn prepare(&self, mut input: TemplateInput) -> Result<TemplateInput> {
        input.title = input.title.trim().to_string();
        input.description = input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let mut seen = HashSet::new();
        input.tags = input
            .tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
            .collect();

        for question in &mut input.questions {
            question.id = question.id.trim().to_string();
            if question.id.is_empty() {
                question.id = Uuid::new_v4().to_string();
            }
            question.title = question.title.trim().to_string();
        }

        TemplateValidator::new(&self.limits)
            .validate(&input)
            .into_result()?;

        Ok(input)
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Template with id {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserRole;
    use crate::database::{format_timestamp, get_memory_pool, run_migrations};
    use crate::models::{Question, QuestionKind, Topic};

    async fn service() -> TemplateService {
        let pool = get_memory_pool().await.unwrap();
        run_migrations(pool.clone()).await.unwrap();

        for name in ["owner", "other", "admin"] {
            sqlx::query(
                "INSERT INTO users (username, email, password_hash, role, created_at) VALUES (?, ?, 'x', 'user', ?)",
            )
            .bind(name)
            .bind(format!("{}@example.com", name))
            .bind(format_timestamp(Utc::now()))
            .execute(&pool)
            .await
            .unwrap();
        }

        TemplateService::new(
            TemplateRepository::new(pool.clone()),
            ResponseRepository::new(pool),
            Arc::new(FormsConfig::default()),
        )
    }

    fn owner() -> AuthUser {
        AuthUser::new(1, "owner".to_string(), UserRole::User)
    }

    fn other() -> AuthUser {
        AuthUser::new(2, "other".to_string(), UserRole::User)
    }

    fn admin() -> AuthUser {
        AuthUser::new(3, "admin".to_string(), UserRole::Admin)
    }

    fn input() -> TemplateInput {
        TemplateInput {
            title: "  Weekly check-in  ".to_string(),
            description: Some("   ".to_string()),
            topic: Topic::Other,
            tags: vec![" team ".to_string(), "team".to_string(), "".to_string()],
            questions: vec![
                Question {
                    id: String::new(),
                    title: "How was your week?".to_string(),
                    required: true,
                    kind: QuestionKind::Text,
                },
                Question {
                    id: "mood".to_string(),
                    title: "Mood".to_string(),
                    required: false,
                    kind: QuestionKind::Radio {
                        options: vec!["good".to_string(), "bad".to_string()],
                    },
                },
            ],
            is_public: true,
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_and_starts_pending() {
        let service = service().await;
        let template = service.create(&owner(), input()).await.unwrap();

        assert_eq!(template.title, "Weekly check-in");
        assert_eq!(template.description, None);
        assert_eq!(template.tags, vec!["team".to_string()]);
        assert_eq!(template.status, TemplateStatus::Pending);
        assert!(Uuid::parse_str(&template.questions[0].id).is_ok());
        assert_eq!(template.questions[1].id, "mood");
    }

    #[tokio::test]
    async fn test_create_reports_structural_errors_by_path() {
        let service = service().await;
        let mut bad = input();
        bad.questions[1].kind = QuestionKind::Select { options: vec![] };

        match service.create(&owner(), bad).await {
            Err(AppError::InvalidInput(result)) => {
                assert!(result.errors.contains_key("questions[1].options"));
            }
            other => panic!("unexpected result: {:?}", other.map(|t| t.id)),
        }
    }

    #[tokio::test]
    async fn test_pending_template_is_hidden_from_others() {
        let service = service().await;
        let template = service.create(&owner(), input()).await.unwrap();

        assert!(service.get(template.id, Some(&owner())).await.is_ok());
        assert!(service.get(template.id, Some(&admin())).await.is_ok());
        assert!(matches!(
            service.get(template.id, None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.get(template.id, Some(&other())).await,
            Err(AppError::NotFound(_))
        ));

        service.approve(template.id).await.unwrap();
        let detail = service.get(template.id, None).await.unwrap();
        assert_eq!(detail.author, "owner");
        assert_eq!(detail.likes, 0);
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_can_change() {
        let service = service().await;
        let template = service.create(&owner(), input()).await.unwrap();
        service.approve(template.id).await.unwrap();

        assert!(matches!(
            service.update(template.id, &other(), input()).await,
            Err(AppError::Authorization(_))
        ));
        assert!(matches!(
            service.delete(template.id, &other()).await,
            Err(AppError::Authorization(_))
        ));

        let mut changed = input();
        changed.title = "Monthly check-in".to_string();
        let updated = service.update(template.id, &admin(), changed).await.unwrap();
        assert_eq!(updated.title, "Monthly check-in");
        assert_eq!(updated.status, TemplateStatus::Active);

        let archived = service.archive(template.id, &owner()).await.unwrap();
        assert_eq!(archived.status, TemplateStatus::Archived);

        service.delete(template.id, &owner()).await.unwrap();
        assert!(matches!(
            service.get(template.id, Some(&admin())).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_listings() {
        let service = service().await;
        let first = service.create(&owner(), input()).await.unwrap();
        service.create(&owner(), input()).await.unwrap();
        service.create(&other(), input()).await.unwrap();
        service.approve(first.id).await.unwrap();

        let pagination = PaginationQuery::default();

        let public = service.list(&pagination).await.unwrap();
        assert_eq!(public.total_count, 1);
        assert_eq!(public.items[0].id, first.id);

        let mine = service.list_for_owner(1, &pagination).await.unwrap();
        assert_eq!(mine.total_count, 2);

        let pending = service
            .list_all(Some(TemplateStatus::Pending), &pagination)
            .await
            .unwrap();
        assert_eq!(pending.total_count, 2);

        let all = service.list_all(None, &pagination).await.unwrap();
        assert_eq!(all.total_count, 3);
    }
}
