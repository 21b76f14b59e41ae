use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::database::{InteractionRepository, TemplateRepository, TemplateRepositoryTrait};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Comment, CreateCommentRequest, LikeStatus, Template};
use crate::services::template_service::can_view;
use crate::validation::ValidationResult;

/// Likes and comments. Both only apply to templates the caller can see.
#[derive(Clone)]
pub struct InteractionService {
    templates: Arc<dyn TemplateRepositoryTrait + Send + Sync>,
    interactions: InteractionRepository,
}

impl InteractionService {
    pub fn new(templates: TemplateRepository, interactions: InteractionRepository) -> Self {
        Self {
            templates: Arc::new(templates),
            interactions,
        }
    }

    pub async fn toggle_like(&self, template_id: Uuid, user: &AuthUser) -> Result<LikeStatus> {
        self.visible_template(template_id, Some(user)).await?;

        let status = self.interactions.toggle_like(template_id, user.user_id).await?;
        info!(%template_id, user_id = user.user_id, liked = status.liked, "like toggled");
        Ok(status)
    }

    pub async fn list_comments(&self, template_id: Uuid, viewer: Option<&AuthUser>) -> Result<Vec<Comment>> {
        self.visible_template(template_id, viewer).await?;
        self.interactions.list_comments(template_id).await
    }

    pub async fn add_comment(
        &self,
        template_id: Uuid,
        user: &AuthUser,
        mut request: CreateCommentRequest,
    ) -> Result<Comment> {
        self.visible_template(template_id, Some(user)).await?;

        request.content = request.content.trim().to_string();
        request.validate().map_err(|errors| {
            AppError::InvalidInput(ValidationResult::from_validation_errors(errors))
        })?;

        let comment = Comment {
            id: Uuid::new_v4(),
            template_id,
            user_id: user.user_id,
            author: user.username.clone(),
            content: request.content,
            created_at: Utc::now(),
        };

        self.interactions.insert_comment(&comment).await?;

        info!(comment_id = %comment.id, %template_id, user_id = user.user_id, "comment added");
        Ok(comment)
    }

    /// Authors may delete their own comments, admins any comment.
    pub async fn delete_comment(&self, template_id: Uuid, comment_id: Uuid, user: &AuthUser) -> Result<()> {
        let comment = self
            .interactions
            .get_comment(comment_id)
            .await?
            .filter(|comment| comment.template_id == template_id)
            .ok_or_else(|| AppError::NotFound(format!("Comment with id {} not found", comment_id)))?;

        if !user.can_manage(comment.user_id) {
            return Err(AppError::Authorization(
                "Only the author or an admin can delete this comment".to_string(),
            ));
        }

        if !self.interactions.delete_comment(comment_id).await? {
            return Err(AppError::NotFound(format!("Comment with id {} not found", comment_id)));
        }

        info!(%comment_id, user_id = user.user_id, "comment deleted");
        Ok(())
    }

    async fn visible_template(&self, id: Uuid, viewer: Option<&AuthUser>) -> Result<Template> {
        self.templates
            .get(id)
            .await?
            .filter(|template| can_view(template, viewer))
            .ok_or_else(|| AppError::NotFound(format!("Template with id {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserRole;
    use crate::database::{format_timestamp, get_memory_pool, run_migrations};
    use crate::models::{Question, QuestionKind, TemplateStatus, Topic};

    async fn setup(status: TemplateStatus) -> (InteractionService, Uuid) {
        let pool = get_memory_pool().await.unwrap();
        run_migrations(pool.clone()).await.unwrap();

        for name in ["alice", "bob"] {
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

        let templates = TemplateRepository::new(pool.clone());
        let now = Utc::now();
        let template = Template {
            id: Uuid::new_v4(),
            title: "Feedback".to_string(),
            description: None,
            topic: Topic::Other,
            tags: vec![],
            questions: vec![Question {
                id: "q1".to_string(),
                title: "Anything else?".to_string(),
                required: false,
                kind: QuestionKind::Text,
            }],
            is_public: true,
            status,
            user_id: 1,
            created_at: now,
            updated_at: now,
        };
        templates.insert(&template).await.unwrap();

        (
            InteractionService::new(templates, InteractionRepository::new(pool)),
            template.id,
        )
    }

    fn alice() -> AuthUser {
        AuthUser::new(1, "alice".to_string(), UserRole::User)
    }

    fn bob() -> AuthUser {
        AuthUser::new(2, "bob".to_string(), UserRole::User)
    }

    fn comment(content: &str) -> CreateCommentRequest {
        CreateCommentRequest {
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_like_toggles() {
        let (service, id) = setup(TemplateStatus::Active).await;

        let liked = service.toggle_like(id, &bob()).await.unwrap();
        assert_eq!(liked, LikeStatus { liked: true, likes: 1 });

        let unliked = service.toggle_like(id, &bob()).await.unwrap();
        assert_eq!(unliked, LikeStatus { liked: false, likes: 0 });
    }

    #[tokio::test]
    async fn test_comment_lifecycle() {
        let (service, id) = setup(TemplateStatus::Active).await;

        let added = service.add_comment(id, &bob(), comment("  Nice form  ")).await.unwrap();
        assert_eq!(added.content, "Nice form");
        assert_eq!(added.author, "bob");

        assert!(matches!(
            service.add_comment(id, &bob(), comment("   ")).await,
            Err(AppError::InvalidInput(_))
        ));

        let comments = service.list_comments(id, None).await.unwrap();
        assert_eq!(comments.len(), 1);

        assert!(matches!(
            service.delete_comment(id, added.id, &alice()).await,
            Err(AppError::Authorization(_))
        ));

        let admin = AuthUser::new(99, "root".to_string(), UserRole::Admin);
        service.delete_comment(id, added.id, &admin).await.unwrap();
        assert!(service.list_comments(id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hidden_template_rejects_interactions() {
        let (service, id) = setup(TemplateStatus::Pending).await;

        assert!(matches!(
            service.toggle_like(id, &bob()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(service.toggle_like(id, &alice()).await.is_ok());
    }
}
