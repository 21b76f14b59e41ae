//! The closed set of question types and what each one accepts.
//!
//! Every answer that reaches the validator is decoded here first. Decoding
//! is the format check: a value that cannot be turned into the typed
//! [`Answer`] for its question type is `FormatInvalid`.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::forms::answer::Answer;
use crate::validation::rules::{is_valid_email, is_valid_phone, is_valid_url};

/// Upper bound on the length of a `text` answer, in characters.
pub const MAX_TEXT_LENGTH: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    String,
    Text,
    Number,
    Checkbox,
    Radio,
    Select,
    Date,
    Email,
    Phone,
    Url,
}

/// Field-level failure kinds. Rendering them as text is up to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    RequiredMissing,
    FormatInvalid,
    OutOfRange,
    NotAnAllowedOption,
    UnknownQuestion,
}

impl std::fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldErrorKind::RequiredMissing => write!(f, "required_missing"),
            FieldErrorKind::FormatInvalid => write!(f, "format_invalid"),
            FieldErrorKind::OutOfRange => write!(f, "out_of_range"),
            FieldErrorKind::NotAnAllowedOption => write!(f, "not_an_allowed_option"),
            FieldErrorKind::UnknownQuestion => write!(f, "unknown_question"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerShape {
    Text,
    Numeric,
    Boolean,
    Date,
}

/// What a form renderer needs to know to draw an input for a type.
#[derive(Debug, Clone, Serialize)]
pub struct TypeDescriptor {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub shape: AnswerShape,
    pub input: &'static str,
    pub has_options: bool,
    pub has_bounds: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl QuestionType {
    pub const ALL: [QuestionType; 10] = [
        QuestionType::String,
        QuestionType::Text,
        QuestionType::Number,
        QuestionType::Checkbox,
        QuestionType::Radio,
        QuestionType::Select,
        QuestionType::Date,
        QuestionType::Email,
        QuestionType::Phone,
        QuestionType::Url,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::String => "string",
            QuestionType::Text => "text",
            QuestionType::Number => "number",
            QuestionType::Checkbox => "checkbox",
            QuestionType::Radio => "radio",
            QuestionType::Select => "select",
            QuestionType::Date => "date",
            QuestionType::Email => "email",
            QuestionType::Phone => "phone",
            QuestionType::Url => "url",
        }
    }

    pub fn shape(&self) -> AnswerShape {
        match self {
            QuestionType::Number => AnswerShape::Numeric,
            QuestionType::Checkbox => AnswerShape::Boolean,
            QuestionType::Date => AnswerShape::Date,
            _ => AnswerShape::Text,
        }
    }

    pub fn has_options(&self) -> bool {
        matches!(self, QuestionType::Radio | QuestionType::Select)
    }

    pub fn has_bounds(&self) -> bool {
        matches!(self, QuestionType::Number | QuestionType::Date)
    }

    pub fn descriptor(&self) -> TypeDescriptor {
        let input = match self {
            QuestionType::String => "text",
            QuestionType::Text => "textarea",
            QuestionType::Number => "number",
            QuestionType::Checkbox => "checkbox",
            QuestionType::Radio => "radio",
            QuestionType::Select => "select",
            QuestionType::Date => "date",
            QuestionType::Email => "email",
            QuestionType::Phone => "tel",
            QuestionType::Url => "url",
        };

        TypeDescriptor {
            question_type: *self,
            shape: self.shape(),
            input,
            has_options: self.has_options(),
            has_bounds: self.has_bounds(),
            max_length: matches!(self, QuestionType::Text).then_some(MAX_TEXT_LENGTH),
        }
    }

    /// Decode a non-empty raw value into this type's answer, applying the
    /// built-in format check on the way.
    pub fn decode_answer(&self, value: &Value) -> Result<Answer, FieldErrorKind> {
        match self {
            QuestionType::String => as_text(value).map(|s| Answer::String(s.to_string())),
            QuestionType::Text => {
                let text = as_text(value)?;
                if text.chars().count() > MAX_TEXT_LENGTH {
                    return Err(FieldErrorKind::FormatInvalid);
                }
                Ok(Answer::Text(text.to_string()))
            }
            QuestionType::Number => decode_number(value).map(Answer::Number),
            QuestionType::Checkbox => decode_flag(value).map(Answer::Checkbox),
            QuestionType::Radio => as_text(value).map(|s| Answer::Radio(s.to_string())),
            QuestionType::Select => as_text(value).map(|s| Answer::Select(s.to_string())),
            QuestionType::Date => decode_date(value).map(Answer::Date),
            QuestionType::Email => {
                let text = as_text(value)?;
                if !is_valid_email(text) {
                    return Err(FieldErrorKind::FormatInvalid);
                }
                Ok(Answer::Email(text.to_string()))
            }
            QuestionType::Phone => {
                let text = as_text(value)?;
                if !is_valid_phone(text) {
                    return Err(FieldErrorKind::FormatInvalid);
                }
                Ok(Answer::Phone(text.to_string()))
            }
            QuestionType::Url => {
                let text = as_text(value)?;
                if !is_valid_url(text) {
                    return Err(FieldErrorKind::FormatInvalid);
                }
                Ok(Answer::Url(text.to_string()))
            }
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Invalid question type: {}", s))
    }
}

/// Descriptors for every registered type, in registry order.
pub fn descriptors() -> Vec<TypeDescriptor> {
    QuestionType::ALL.iter().map(QuestionType::descriptor).collect()
}

fn as_text(value: &Value) -> Result<&str, FieldErrorKind> {
    value.as_str().ok_or(FieldErrorKind::FormatInvalid)
}

fn decode_number(value: &Value) -> Result<f64, FieldErrorKind> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    number
        .filter(|n| n.is_finite())
        .ok_or(FieldErrorKind::FormatInvalid)
}

fn decode_flag(value: &Value) -> Result<bool, FieldErrorKind> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        _ => Err(FieldErrorKind::FormatInvalid),
    }
}

fn decode_date(value: &Value) -> Result<NaiveDate, FieldErrorKind> {
    let text = as_text(value)?.trim();

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.date_naive())
        .map_err(|_| FieldErrorKind::FormatInvalid)
}
