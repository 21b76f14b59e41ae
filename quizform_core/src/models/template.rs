//! Templates and their questions

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::forms::QuestionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topic {
    Education,
    Quiz,
    Other,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Education => "Education",
            Topic::Quiz => "Quiz",
            Topic::Other => "Other",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Education" => Ok(Topic::Education),
            "Quiz" => Ok(Topic::Quiz),
            "Other" => Ok(Topic::Other),
            _ => Err(format!("Invalid topic: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    Pending,
    Active,
    Archived,
}

impl TemplateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateStatus::Pending => "pending",
            TemplateStatus::Active => "active",
            TemplateStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for TemplateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TemplateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TemplateStatus::Pending),
            "active" => Ok(TemplateStatus::Active),
            "archived" => Ok(TemplateStatus::Archived),
            _ => Err(format!("Invalid template status: {}", s)),
        }
    }
}

/// One typed input of a template.
///
/// On the wire a question is a flat object, e.g.
/// `{"id": "age", "title": "Age", "type": "number", "required": true, "min": 0}`.
/// Options only exist on choice questions and bounds only on number and
/// date questions; fields that do not apply to the declared type are
/// dropped when decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuestionKind {
    String,
    Text,
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Checkbox,
    Radio {
        #[serde(default)]
        options: Vec<String>,
    },
    Select {
        #[serde(default)]
        options: Vec<String>,
    },
    Date {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<NaiveDate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<NaiveDate>,
    },
    Email,
    Phone,
    Url,
}

impl QuestionKind {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::String => QuestionType::String,
            QuestionKind::Text => QuestionType::Text,
            QuestionKind::Number { .. } => QuestionType::Number,
            QuestionKind::Checkbox => QuestionType::Checkbox,
            QuestionKind::Radio { .. } => QuestionType::Radio,
            QuestionKind::Select { .. } => QuestionType::Select,
            QuestionKind::Date { .. } => QuestionType::Date,
            QuestionKind::Email => QuestionType::Email,
            QuestionKind::Phone => QuestionType::Phone,
            QuestionKind::Url => QuestionType::Url,
        }
    }

    pub fn options(&self) -> Option<&[String]> {
        match self {
            QuestionKind::Radio { options } | QuestionKind::Select { options } => Some(options),
            _ => None,
        }
    }

    /// False when both bounds are set and `min > max`.
    pub fn bounds_ordered(&self) -> bool {
        match self {
            QuestionKind::Number { min: Some(min), max: Some(max) } => min <= max,
            QuestionKind::Date { min: Some(min), max: Some(max) } => min <= max,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub topic: Topic,
    pub tags: Vec<String>,
    pub questions: Vec<Question>,
    pub is_public: bool,
    pub status: TemplateStatus,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    pub fn is_active(&self) -> bool {
        self.status == TemplateStatus::Active
    }
}

/// A template together with its author and engagement counts.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateDetail {
    #[serde(flatten)]
    pub template: Template,
    pub author: String,
    pub likes: i64,
    pub response_count: i64,
}

/// Body of `POST /api/templates` and `PUT /api/templates/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TemplateInput {
    #[validate(length(min = 3, max = 100, message = "Title must be between 3 and 100 characters"))]
    pub title: String,

    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description: Option<String>,

    pub topic: Topic,

    #[serde(default)]
    pub tags: Vec<String>,

    pub questions: Vec<Question>,

    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct PopularTemplate {
    pub id: Uuid,
    pub title: String,
    pub topic: Topic,
    pub author: String,
    pub response_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}
