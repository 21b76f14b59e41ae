use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{ResponseRepositoryTrait, TemplateRepositoryTrait};
use crate::error::{AppError, Result};
use crate::forms::{self, Answers};
use crate::middleware::auth::AuthUser;
use crate::models::{DryRunResponse, StoredResponse, Template};

type Templates = Arc<dyn TemplateRepositoryTrait + Send + Sync>;
type Responses = Arc<dyn ResponseRepositoryTrait + Send + Sync>;

/// Accepts answer sets for templates. Nothing is written unless every
/// answer passed validation.
#[derive(Clone)]
pub struct SubmissionService {
    templates: Templates,
    responses: Responses,
}

impl SubmissionService {
    pub fn new(templates: Templates, responses: Responses) -> Self {
        Self {
            templates,
            responses,
        }
    }

    pub async fn submit(
        &self,
        template_id: Uuid,
        answers: Answers,
        submitter: Option<&AuthUser>,
    ) -> Result<StoredResponse> {
        let template = self.load(template_id).await?;

        // Private templates stay invisible to strangers whatever their status.
        if !template.is_public && !submitter.map_or(false, |user| user.can_manage(template.user_id)) {
            return Err(not_found(template_id));
        }

        if !template.is_active() {
            warn!(%template_id, status = %template.status, "submission to inactive template");
            return Err(AppError::TemplateInactive);
        }

        let report = forms::validate(&template.questions, &answers);
        if let Err(errors) = report.into_result() {
            warn!(%template_id, invalid = errors.len(), "submission rejected");
            return Err(AppError::Validation(errors));
        }

        let response = StoredResponse {
            id: Uuid::new_v4(),
            template_id,
            user_id: submitter.map(|user| user.user_id),
            answers,
            created_at: Utc::now(),
        };

        self.responses.insert(&response).await?;

        info!(response_id = %response.id, %template_id, "response stored");
        Ok(response)
    }

    /// Runs the submission validator without storing anything. Works for
    /// any template the caller can see, active or not.
    pub async fn dry_run(
        &self,
        template_id: Uuid,
        answers: &Answers,
        viewer: Option<&AuthUser>,
    ) -> Result<DryRunResponse> {
        let template = self.load(template_id).await?;

        if !super::template_service::can_view(&template, viewer) {
            return Err(not_found(template_id));
        }

        Ok(DryRunResponse {
            template_id,
            report: forms::validate(&template.questions, answers),
        })
    }

    async fn load(&self, template_id: Uuid) -> Result<Template> {
        self.templates
            .get(template_id)
            .await?
            .ok_or_else(|| not_found(template_id))
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Template with id {} not found", id))
}
