use chrono::NaiveDate;
use serde_json::Value;

use crate::forms::registry::QuestionType;

/// Raw answers as submitted, keyed by question id.
pub type Answers = serde_json::Map<String, Value>;

/// A decoded answer. Each variant carries the payload its question type
/// accepts, so an answer that made it this far has the right shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    String(String),
    Text(String),
    Number(f64),
    Checkbox(bool),
    Radio(String),
    Select(String),
    Date(NaiveDate),
    Email(String),
    Phone(String),
    Url(String),
}

impl Answer {
    pub fn question_type(&self) -> QuestionType {
        match self {
            Answer::String(_) => QuestionType::String,
            Answer::Text(_) => QuestionType::Text,
            Answer::Number(_) => QuestionType::Number,
            Answer::Checkbox(_) => QuestionType::Checkbox,
            Answer::Radio(_) => QuestionType::Radio,
            Answer::Select(_) => QuestionType::Select,
            Answer::Date(_) => QuestionType::Date,
            Answer::Email(_) => QuestionType::Email,
            Answer::Phone(_) => QuestionType::Phone,
            Answer::Url(_) => QuestionType::Url,
        }
    }

    /// The chosen option, for radio and select answers.
    pub fn choice(&self) -> Option<&str> {
        match self {
            Answer::Radio(choice) | Answer::Select(choice) => Some(choice),
            _ => None,
        }
    }
}

/// Absent, null, blank strings and empty arrays count as "no answer".
/// `false` is a real checkbox answer.
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}
