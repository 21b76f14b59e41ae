use serde::Deserialize;

use crate::models::{TemplateStatus, Topic};

/// A positional SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
}

/// Conditions on the `templates t JOIN users u` listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateFilters {
    pub text: Option<String>,
    pub topic: Option<Topic>,
    pub tag: Option<String>,
    pub author: Option<String>,
    pub user_id: Option<i64>,
    pub status: Option<TemplateStatus>,
    #[serde(default)]
    pub public_only: bool,
}

impl TemplateFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// What anonymous visitors may browse: active and public.
    pub fn browsable() -> Self {
        Self {
            status: Some(TemplateStatus::Active),
            public_only: true,
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_topic(mut self, topic: Topic) -> Self {
        self.topic = Some(topic);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_status(mut self, status: TemplateStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn has_filters(&self) -> bool {
        self.text.is_some()
            || self.topic.is_some()
            || self.tag.is_some()
            || self.author.is_some()
            || self.user_id.is_some()
            || self.status.is_some()
            || self.public_only
    }

    pub fn build_where_clause(&self) -> (String, Vec<SqlParam>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", escape_like(&text.to_lowercase()));
            conditions.push(
                "(LOWER(t.title) LIKE ? ESCAPE '\\' OR LOWER(COALESCE(t.description, '')) LIKE ? ESCAPE '\\')"
                    .to_string(),
            );
            params.push(SqlParam::Text(pattern.clone()));
            params.push(SqlParam::Text(pattern));
        }

        if let Some(topic) = self.topic {
            conditions.push("t.topic = ?".to_string());
            params.push(SqlParam::Text(topic.as_str().to_string()));
        }

        if let Some(tag) = &self.tag {
            // tags are stored as a JSON array; compare whole elements
            conditions.push(
                "EXISTS (SELECT 1 FROM json_each(t.tags) WHERE json_each.value = ?)".to_string(),
            );
            params.push(SqlParam::Text(tag.clone()));
        }

        if let Some(author) = &self.author {
            conditions.push("u.username = ?".to_string());
            params.push(SqlParam::Text(author.clone()));
        }

        if let Some(user_id) = self.user_id {
            conditions.push("t.user_id = ?".to_string());
            params.push(SqlParam::Int(user_id));
        }

        if let Some(status) = self.status {
            conditions.push("t.status = ?".to_string());
            params.push(SqlParam::Text(status.as_str().to_string()));
        }

        if self.public_only {
            conditions.push("t.is_public = 1".to_string());
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }
}

/// Makes `%`, `_` and the escape character itself match literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
