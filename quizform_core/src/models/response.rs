use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::forms::{Answers, ValidationReport};

/// A persisted, immutable answer set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResponse {
    pub id: Uuid,
    pub template_id: Uuid,
    pub user_id: Option<i64>,
    pub answers: Answers,
    pub created_at: DateTime<Utc>,
}

/// Body of the submission and dry-run endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponseRequest {
    #[serde(default)]
    pub answers: Answers,
}

#[derive(Debug, Clone, Serialize)]
pub struct DryRunResponse {
    pub template_id: Uuid,
    #[serde(flatten)]
    pub report: ValidationReport,
}

/// A response listed for the current user, with the template title.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponseSummary {
    pub id: Uuid,
    pub template_id: Uuid,
    pub template_title: String,
    pub created_at: DateTime<Utc>,
}
