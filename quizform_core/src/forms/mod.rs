//! Question types and response validation.

pub mod answer;
pub mod registry;
pub mod validator;

pub use answer::{is_empty, Answer, Answers};
pub use registry::{descriptors, AnswerShape, FieldErrorKind, QuestionType, TypeDescriptor, MAX_TEXT_LENGTH};
pub use validator::{validate, validate_question, FieldErrors, FieldOutcome, ValidationReport};
