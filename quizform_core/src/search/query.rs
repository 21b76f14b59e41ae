use serde::Deserialize;

use crate::models::Topic;
use crate::search::filters::TemplateFilters;

/// Query string of `GET /api/search` and `GET /api/templates`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub topic: Option<Topic>,
    pub tag: Option<String>,
    pub author: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.q = Some(text.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_pagination(mut self, offset: i64, limit: i64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Restricted to what anyone may browse: active, public templates.
    pub fn to_filters(&self) -> TemplateFilters {
        let mut filters = TemplateFilters::browsable();

        if let Some(text) = self.q.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            filters = filters.with_text(text);
        }
        if let Some(topic) = self.topic {
            filters = filters.with_topic(topic);
        }
        if let Some(tag) = self.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            filters = filters.with_tag(tag);
        }
        if let Some(author) = self.author.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            filters = filters.with_author(author);
        }

        filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TemplateStatus;

    #[test]
    fn test_filters_are_always_browsable() {
        let filters = SearchQuery::new().to_filters();
        assert_eq!(filters.status, Some(TemplateStatus::Active));
        assert!(filters.public_only);
        assert!(filters.text.is_none());
    }

    #[test]
    fn test_blank_terms_are_dropped() {
        let filters = SearchQuery::new().with_text("   ").with_tag("").to_filters();
        assert!(filters.text.is_none());
        assert!(filters.tag.is_none());

        let filters = SearchQuery::new().with_text(" rust ").with_tag("lang").to_filters();
        assert_eq!(filters.text.as_deref(), Some("rust"));
        assert_eq!(filters.tag.as_deref(), Some("lang"));
    }

    #[test]
    fn test_negative_offset_is_clamped() {
        let query = SearchQuery::new().with_pagination(-5, 10);
        assert_eq!(query.offset(), 0);
    }
}
