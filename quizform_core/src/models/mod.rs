pub mod interaction;
pub mod request;
pub mod response;
pub mod template;

pub use interaction::{Comment, CreateCommentRequest, LikeStatus};
pub use request::{ApiResponse, Page, PaginationQuery};
pub use response::{DryRunResponse, StoredResponse, SubmitResponseRequest, UserResponseSummary};
pub use template::{
    PopularTemplate, Question, QuestionKind, TagCount, Template, TemplateDetail, TemplateInput,
    TemplateStatus, Topic,
};
