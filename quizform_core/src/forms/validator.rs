//! Response validation.
//!
//! [`validate`] is pure: it reads the question list and the answers and
//! nothing else. The dry-run endpoint and the submission endpoint both call
//! it, so what a renderer shows inline is exactly what the server enforces.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::forms::answer::{is_empty, Answer, Answers};
use crate::forms::registry::FieldErrorKind;
use crate::models::template::{Question, QuestionKind};

/// Field errors keyed by question id, in reporting order.
pub type FieldErrors = IndexMap<String, FieldErrorKind>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOutcome {
    Valid,
    Invalid(FieldErrorKind),
}

impl FieldOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, FieldOutcome::Valid)
    }

    pub fn error(&self) -> Option<FieldErrorKind> {
        match self {
            FieldOutcome::Valid => None,
            FieldOutcome::Invalid(kind) => Some(*kind),
        }
    }
}

impl Serialize for FieldOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldOutcome::Valid => serializer.serialize_str("valid"),
            FieldOutcome::Invalid(kind) => kind.serialize(serializer),
        }
    }
}

/// Outcome for every declared question, followed by any answer keys that
/// do not belong to the template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    accepted: bool,
    outcomes: IndexMap<String, FieldOutcome>,
}

impl ValidationReport {
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn outcome(&self, question_id: &str) -> Option<FieldOutcome> {
        self.outcomes.get(question_id).copied()
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (&str, FieldOutcome)> {
        self.outcomes.iter().map(|(id, outcome)| (id.as_str(), *outcome))
    }

    pub fn errors(&self) -> FieldErrors {
        self.outcomes
            .iter()
            .filter_map(|(id, outcome)| outcome.error().map(|kind| (id.clone(), kind)))
            .collect()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.accepted {
            Ok(())
        } else {
            Err(self.errors())
        }
    }
}

pub fn validate(questions: &[Question], answers: &Answers) -> ValidationReport {
    let mut outcomes = IndexMap::with_capacity(questions.len());

    for question in questions {
        let outcome = validate_question(question, answers.get(&question.id));
        outcomes.entry(question.id.clone()).or_insert(outcome);
    }

    let mut unknown: Vec<&String> = answers
        .keys()
        .filter(|key| !outcomes.contains_key(key.as_str()))
        .collect();
    unknown.sort();

    for key in unknown {
        outcomes.insert(key.clone(), FieldOutcome::Invalid(FieldErrorKind::UnknownQuestion));
    }

    let accepted = outcomes.values().all(FieldOutcome::is_valid);

    ValidationReport { accepted, outcomes }
}

pub fn validate_question(question: &Question, value: Option<&Value>) -> FieldOutcome {
    if is_empty(value) {
        return if question.required {
            FieldOutcome::Invalid(FieldErrorKind::RequiredMissing)
        } else {
            FieldOutcome::Valid
        };
    }

    let Some(value) = value else {
        return FieldOutcome::Valid;
    };

    let answer = match question.kind.question_type().decode_answer(value) {
        Ok(answer) => answer,
        Err(kind) => return FieldOutcome::Invalid(kind),
    };

    if !within_bounds(&question.kind, &answer) {
        return FieldOutcome::Invalid(FieldErrorKind::OutOfRange);
    }

    if let Some(options) = question.kind.options() {
        let chosen = answer.choice().unwrap_or_default();
        if !options.iter().any(|option| option == chosen) {
            return FieldOutcome::Invalid(FieldErrorKind::NotAnAllowedOption);
        }
    }

    FieldOutcome::Valid
}

fn within_bounds(kind: &QuestionKind, answer: &Answer) -> bool {
    match (kind, answer) {
        (QuestionKind::Number { min, max }, Answer::Number(n)) => {
            min.map_or(true, |min| *n >= min) && max.map_or(true, |max| *n <= max)
        }
        (QuestionKind::Date { min, max }, Answer::Date(d)) => {
            min.map_or(true, |min| *d >= min) && max.map_or(true, |max| *d <= max)
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn question(id: &str, required: bool, kind: QuestionKind) -> Question {
        Question {
            id: id.to_string(),
            title: format!("Question {}", id),
            required,
            kind,
        }
    }

    fn answers(value: Value) -> Answers {
        value.as_object().cloned().unwrap()
    }

    fn outcome_for(question: &Question, value: Value) -> FieldOutcome {
        validate_question(question, Some(&value))
    }

    #[test]
    fn test_required_question_with_absent_value() {
        let questions = vec![question("q1", true, QuestionKind::String)];
        let report = validate(&questions, &Answers::new());

        assert!(!report.is_accepted());
        assert_eq!(
            report.outcome("q1"),
            Some(FieldOutcome::Invalid(FieldErrorKind::RequiredMissing))
        );
    }

    #[test]
    fn test_required_question_with_blank_value() {
        let q = question("q1", true, QuestionKind::Email);
        assert_eq!(
            outcome_for(&q, json!("  ")),
            FieldOutcome::Invalid(FieldErrorKind::RequiredMissing)
        );
        assert_eq!(
            outcome_for(&q, Value::Null),
            FieldOutcome::Invalid(FieldErrorKind::RequiredMissing)
        );
    }

    #[test]
    fn test_optional_question_skips_all_checks_when_empty() {
        let q = question("q1", false, QuestionKind::Number { min: Some(1.0), max: Some(10.0) });
        assert_eq!(validate_question(&q, None), FieldOutcome::Valid);
        assert_eq!(outcome_for(&q, json!("")), FieldOutcome::Valid);
    }

    #[test]
    fn test_number_bounds() {
        let q = question("n", true, QuestionKind::Number { min: Some(1.0), max: Some(10.0) });

        assert_eq!(outcome_for(&q, json!(0)), FieldOutcome::Invalid(FieldErrorKind::OutOfRange));
        assert_eq!(outcome_for(&q, json!(5)), FieldOutcome::Valid);
        assert_eq!(outcome_for(&q, json!("abc")), FieldOutcome::Invalid(FieldErrorKind::FormatInvalid));
        assert_eq!(outcome_for(&q, json!(10)), FieldOutcome::Valid);
        assert_eq!(outcome_for(&q, json!("10.5")), FieldOutcome::Invalid(FieldErrorKind::OutOfRange));
    }

    #[test]
    fn test_one_sided_bounds() {
        let q = question("n", false, QuestionKind::Number { min: None, max: Some(3.0) });
        assert_eq!(outcome_for(&q, json!(-100)), FieldOutcome::Valid);
        assert_eq!(outcome_for(&q, json!(4)), FieldOutcome::Invalid(FieldErrorKind::OutOfRange));
    }

    #[test]
    fn test_date_bounds() {
        let q = question(
            "d",
            false,
            QuestionKind::Date {
                min: NaiveDate::from_ymd_opt(2024, 1, 1),
                max: NaiveDate::from_ymd_opt(2024, 12, 31),
            },
        );

        assert_eq!(outcome_for(&q, json!("2024-06-15")), FieldOutcome::Valid);
        assert_eq!(outcome_for(&q, json!("2023-12-31")), FieldOutcome::Invalid(FieldErrorKind::OutOfRange));
        assert_eq!(outcome_for(&q, json!("June 15")), FieldOutcome::Invalid(FieldErrorKind::FormatInvalid));
    }

    #[test]
    fn test_email() {
        let q = question("e", true, QuestionKind::Email);
        assert_eq!(outcome_for(&q, json!("user@example.com")), FieldOutcome::Valid);
        assert_eq!(outcome_for(&q, json!("not-an-email")), FieldOutcome::Invalid(FieldErrorKind::FormatInvalid));
    }

    #[test]
    fn test_radio_options() {
        let q = question(
            "r",
            true,
            QuestionKind::Radio { options: vec!["A".to_string(), "B".to_string()] },
        );
        assert_eq!(outcome_for(&q, json!("C")), FieldOutcome::Invalid(FieldErrorKind::NotAnAllowedOption));
        assert_eq!(outcome_for(&q, json!("A")), FieldOutcome::Valid);
        assert_eq!(outcome_for(&q, json!(1)), FieldOutcome::Invalid(FieldErrorKind::FormatInvalid));
    }

    #[test]
    fn test_select_options() {
        let q = question(
            "s",
            false,
            QuestionKind::Select { options: vec!["red".to_string(), "blue".to_string()] },
        );
        assert_eq!(outcome_for(&q, json!("blue")), FieldOutcome::Valid);
        assert_eq!(outcome_for(&q, json!("Blue")), FieldOutcome::Invalid(FieldErrorKind::NotAnAllowedOption));
    }

    #[test]
    fn test_checkbox_false_satisfies_required() {
        let q = question("c", true, QuestionKind::Checkbox);
        assert_eq!(outcome_for(&q, json!(false)), FieldOutcome::Valid);
        assert_eq!(outcome_for(&q, json!("maybe")), FieldOutcome::Invalid(FieldErrorKind::FormatInvalid));
    }

    #[test]
    fn test_all_errors_reported_together() {
        let questions = vec![
            question("name", true, QuestionKind::String),
            question("age", true, QuestionKind::Number { min: Some(18.0), max: None }),
            question("email", false, QuestionKind::Email),
            question("bio", false, QuestionKind::Text),
        ];
        let submitted = answers(json!({
            "age": 12,
            "email": "nope",
            "bio": "fine",
        }));

        let report = validate(&questions, &submitted);
        let errors = report.errors();

        assert!(!report.is_accepted());
        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["name", "age", "email"]
        );
        assert_eq!(errors["name"], FieldErrorKind::RequiredMissing);
        assert_eq!(errors["age"], FieldErrorKind::OutOfRange);
        assert_eq!(errors["email"], FieldErrorKind::FormatInvalid);
        assert_eq!(report.outcome("bio"), Some(FieldOutcome::Valid));
    }

    #[test]
    fn test_unknown_answer_keys_are_rejected() {
        let questions = vec![question("q1", false, QuestionKind::String)];
        let submitted = answers(json!({ "q1": "hi", "zz": 1, "extra": "x" }));

        let report = validate(&questions, &submitted);
        let errors = report.into_result().unwrap_err();

        assert_eq!(
            errors.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["extra", "zz"]
        );
        assert!(errors.values().all(|kind| *kind == FieldErrorKind::UnknownQuestion));
    }

    #[test]
    fn test_fully_valid_submission_is_accepted() {
        let questions = vec![
            question("q1", true, QuestionKind::String),
            question("q2", true, QuestionKind::Phone),
            question("q3", false, QuestionKind::Url),
        ];
        let submitted = answers(json!({
            "q1": "Ada",
            "q2": "+44 20 7946 0958",
            "q3": "https://example.org",
        }));

        let report = validate(&questions, &submitted);
        assert!(report.is_accepted());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_validation_is_deterministic() {
        let questions = vec![
            question("a", true, QuestionKind::Number { min: Some(1.0), max: Some(10.0) }),
            question("b", true, QuestionKind::Radio { options: vec!["x".to_string()] }),
        ];
        let submitted = answers(json!({ "a": "abc", "b": "y", "c": true }));

        let first = validate(&questions, &submitted);
        let second = validate(&questions, &submitted);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_report_serialization() {
        let questions = vec![
            question("a", true, QuestionKind::String),
            question("b", false, QuestionKind::String),
        ];
        let report = validate(&questions, &Answers::new());
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["accepted"], false);
        assert_eq!(value["outcomes"]["a"], "required_missing");
        assert_eq!(value["outcomes"]["b"], "valid");
    }
}
