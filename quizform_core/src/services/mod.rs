pub mod interaction_service;
pub mod submission_service;
pub mod template_service;

pub use interaction_service::InteractionService;
pub use submission_service::SubmissionService;
pub use template_service::TemplateService;
