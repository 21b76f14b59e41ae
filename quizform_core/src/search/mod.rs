pub mod engine;
pub mod filters;
pub mod query;

pub use engine::SearchEngine;
pub use filters::{SqlParam, TemplateFilters};
pub use query::SearchQuery;
