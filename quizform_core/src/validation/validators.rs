//! Validators for template definitions

use std::collections::HashSet;

use super::{rules::*, Validatable, ValidationResult};
use crate::config::FormsConfig;
use crate::models::template::{Question, TemplateInput};

const QUESTION_TITLE_MIN: usize = 3;
const QUESTION_TITLE_MAX: usize = 200;

/// Checks a template definition against the form limits. Every problem is
/// reported under its own field path.
pub struct TemplateValidator<'a> {
    limits: &'a FormsConfig,
}

impl<'a> TemplateValidator<'a> {
    pub fn new(limits: &'a FormsConfig) -> Self {
        Self { limits }
    }

    pub fn validate(&self, input: &TemplateInput) -> ValidationResult {
        let mut result = input.validate_comprehensive();

        result.merge(self.validate_tags(&input.tags));
        result.merge(self.validate_questions(&input.questions));

        result
    }

    pub fn validate_tags(&self, tags: &[String]) -> ValidationResult {
        let mut result = ValidationResult::success();

        if tags.len() > self.limits.max_tags {
            result.add_error(
                "tags",
                &format!("A template can have at most {} tags", self.limits.max_tags),
            );
        }

        for (i, tag) in tags.iter().enumerate() {
            if validate_tag(tag, self.limits.max_tag_length).is_err() {
                result.add_error(
                    &format!("tags[{}]", i),
                    &format!("Tag must be between 1 and {} characters", self.limits.max_tag_length),
                );
            }
        }

        result
    }

    pub fn validate_questions(&self, questions: &[Question]) -> ValidationResult {
        let mut result = ValidationResult::success();

        if questions.is_empty() || questions.len() > self.limits.max_questions {
            result.add_error(
                "questions",
                &format!(
                    "A template needs between 1 and {} questions",
                    self.limits.max_questions
                ),
            );
        }

        let mut seen_ids = HashSet::new();

        for (i, question) in questions.iter().enumerate() {
            let path = format!("questions[{}]", i);

            if question.id.trim().is_empty() {
                result.add_error(&format!("{}.id", path), "Question id cannot be empty");
            } else if !seen_ids.insert(question.id.as_str()) {
                result.add_error(&format!("{}.id", path), "Question ids must be unique");
            }

            if validate_text_length(&question.title, QUESTION_TITLE_MIN, QUESTION_TITLE_MAX).is_err() {
                result.add_error(
                    &format!("{}.title", path),
                    "Question title must be between 3 and 200 characters",
                );
            }

            if let Some(options) = question.kind.options() {
                if let Some(message) = check_options(options) {
                    result.add_error(&format!("{}.options", path), message);
                }
            }

            if !question.kind.bounds_ordered() {
                result.add_error(&format!("{}.min", path), "Minimum must not exceed maximum");
            }
        }

        result
    }
}

fn check_options(options: &[String]) -> Option<&'static str> {
    if options.is_empty() {
        return Some("Choice questions need at least one option");
    }

    if options.iter().any(|option| option.trim().is_empty()) {
        return Some("Options cannot be empty");
    }

    let distinct: HashSet<&str> = options.iter().map(String::as_str).collect();
    if distinct.len() != options.len() {
        return Some("Options must be distinct");
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::template::{QuestionKind, Topic};

    fn question(id: &str, kind: QuestionKind) -> Question {
        Question {
            id: id.to_string(),
            title: "What is it?".to_string(),
            required: false,
            kind,
        }
    }

    fn input(questions: Vec<Question>) -> TemplateInput {
        TemplateInput {
            title: "Team survey".to_string(),
            description: Some("Quarterly check-in".to_string()),
            topic: Topic::Other,
            tags: vec!["team".to_string()],
            questions,
            is_public: true,
        }
    }

    #[test]
    fn test_valid_template() {
        let limits = FormsConfig::default();
        let template = input(vec![
            question("q1", QuestionKind::String),
            question("q2", QuestionKind::Radio { options: vec!["A".to_string(), "B".to_string()] }),
        ]);

        let result = TemplateValidator::new(&limits).validate(&template);
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn test_title_and_question_count() {
        let limits = FormsConfig::default();
        let mut template = input(vec![]);
        template.title = "ab".to_string();

        let result = TemplateValidator::new(&limits).validate(&template);
        assert!(!result.is_valid);
        assert!(result.errors.contains_key("title"));
        assert!(result.errors.contains_key("questions"));
    }

    #[test]
    fn test_too_many_questions() {
        let limits = FormsConfig::default();
        let questions = (0..17)
            .map(|i| question(&format!("q{}", i), QuestionKind::Text))
            .collect();

        let result = TemplateValidator::new(&limits).validate(&input(questions));
        assert!(result.errors.contains_key("questions"));
    }

    #[test]
    fn test_question_level_errors_use_paths() {
        let limits = FormsConfig::default();
        let mut short_title = question("q2", QuestionKind::Email);
        short_title.title = "Hi".to_string();

        let template = input(vec![
            question("q1", QuestionKind::Radio { options: vec![] }),
            short_title,
            question("q1", QuestionKind::Select { options: vec!["x".to_string(), "x".to_string()] }),
            question("q4", QuestionKind::Number { min: Some(10.0), max: Some(1.0) }),
        ]);

        let result = TemplateValidator::new(&limits).validate(&template);

        assert!(result.errors.contains_key("questions[0].options"));
        assert!(result.errors.contains_key("questions[1].title"));
        assert!(result.errors.contains_key("questions[2].id"));
        assert!(result.errors.contains_key("questions[2].options"));
        assert!(result.errors.contains_key("questions[3].min"));
        assert!(!result.errors.contains_key("questions[0].id"));
    }

    #[test]
    fn test_tag_limits() {
        let limits = FormsConfig::default();
        let mut template = input(vec![question("q1", QuestionKind::Checkbox)]);
        template.tags = (0..21).map(|i| format!("tag{}", i)).collect();
        template.tags.push(" ".to_string());

        let result = TemplateValidator::new(&limits).validate(&template);
        assert!(result.errors.contains_key("tags"));
        assert!(result.errors.contains_key("tags[21]"));
    }
}
