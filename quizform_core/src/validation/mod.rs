//! Structural validation of request bodies.
//!
//! Answers to questions are checked by [`crate::forms::validate`]; this
//! module covers everything else a client sends: template definitions,
//! account details and comments.

pub mod rules;
pub mod validators;

pub use rules::*;
pub use validators::*;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// Messages per field path (`title`, `questions[2].options`, ...), in the
/// order they were found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: IndexMap<String, Vec<String>>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self {
            is_valid: true,
            errors: IndexMap::new(),
        }
    }

    pub fn from_validation_errors(errors: ValidationErrors) -> Self {
        let mut result = Self::success();

        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        for (field, field_errors) in fields {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Validation failed for field '{}'", field));
                result.add_error(&field, &message);
            }
        }

        result
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
        }

        for (field, errors) in other.errors {
            self.errors.entry(field).or_default().extend(errors);
        }
    }

    pub fn into_result(self) -> crate::error::Result<()> {
        if self.is_valid {
            Ok(())
        } else {
            Err(crate::error::AppError::InvalidInput(self))
        }
    }
}

pub trait Validatable {
    fn validate_comprehensive(&self) -> ValidationResult;
}

impl<T> Validatable for T
where
    T: Validate,
{
    fn validate_comprehensive(&self) -> ValidationResult {
        match self.validate() {
            Ok(_) => ValidationResult::success(),
            Err(errors) => ValidationResult::from_validation_errors(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_first_seen_order() {
        let mut first = ValidationResult::success();
        first.add_error("title", "too short");

        let mut second = ValidationResult::success();
        second.add_error("questions[0].title", "too short");
        second.add_error("title", "bad characters");

        first.merge(second);

        assert!(!first.is_valid);
        assert_eq!(
            first.errors.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["title", "questions[0].title"]
        );
        assert_eq!(first.errors["title"].len(), 2);
    }

    #[test]
    fn test_success_into_result() {
        assert!(ValidationResult::success().into_result().is_ok());

        let mut failed = ValidationResult::success();
        failed.add_error("tags", "too many");
        assert!(failed.into_result().is_err());
    }
}
