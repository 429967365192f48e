//! # Document Templates
//!
//! Templates are Markdown skeletons a new document can start from. They come
//! from a [`TemplateSource`]:
//!
//! - [`http::HttpTemplateClient`] talks to a template service over HTTP.
//! - [`builtin::BuiltinTemplates`] is a small library compiled into the binary.
//!
//! The configured source locator picks one: `builtin:` (or empty) selects the
//! bundled library, anything else is the base URL of a template service.
//!
//! ## Fallback Rules
//!
//! [`fetch_with_fallback`] never fails. What the caller gets back depends on
//! how the fetch went:
//!
//! | Outcome | `templates` | `error` | `fallback` |
//! |---------|-------------|---------|------------|
//! | success | remote list | none | false |
//! | unreachable, timeout or error status | bundled list | set | true |
//! | reply is not a template list | empty | set | false |
//! | invalid query | empty | set | false |

use crate::config::StudioConfig;
use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub mod builtin;
pub mod http;

pub const DEFAULT_LIMIT: usize = 100;
pub const DEFAULT_SEARCH_LIMIT: usize = 50;
pub const MIN_SEARCH_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of an upload request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateUpload {
    pub id: String,
    pub name: String,
    pub description: String,
    pub content: String,
}

impl TemplateUpload {
    pub fn validate(&self) -> Result<()> {
        validate_template_id(&self.id)?;
        if self.name.trim().is_empty() {
            return Err(StudioError::Validation(
                "Template name cannot be empty".to_string(),
            ));
        }
        if self.content.trim().is_empty() {
            return Err(StudioError::Validation(
                "Template content cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Envelope the template service wraps write replies in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl TemplateQuery {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn in_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(if self.search.is_some() {
            DEFAULT_SEARCH_LIMIT
        } else {
            DEFAULT_LIMIT
        })
    }

    pub fn validate(&self) -> Result<()> {
        match &self.search {
            Some(q) if q.trim().chars().count() < MIN_SEARCH_LEN => {
                Err(StudioError::Validation(format!(
                    "Search text must be at least {} characters",
                    MIN_SEARCH_LEN
                )))
            }
            _ => Ok(()),
        }
    }

    /// Apply the query to an in-memory list, the way the service does.
    pub fn apply(&self, templates: &[Template]) -> Vec<Template> {
        let needle = self.search.as_ref().map(|q| q.trim().to_lowercase());
        templates
            .iter()
            .filter(|t| match &self.category {
                Some(c) => t.category.as_deref() == Some(c.as_str()),
                None => true,
            })
            .filter(|t| match &needle {
                Some(n) => {
                    t.name.to_lowercase().contains(n)
                        || t.description.to_lowercase().contains(n)
                        || t
                            .category
                            .as_deref()
                            .is_some_and(|c| c.to_lowercase().contains(n))
                }
                None => true,
            })
            .skip(self.skip)
            .take(self.effective_limit())
            .cloned()
            .collect()
    }
}

/// Template ids end up in URL paths, so they stay within `[A-Za-z0-9_.-]`.
pub fn validate_template_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(StudioError::Validation(
            "Template id cannot be empty".to_string(),
        ));
    }
    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(StudioError::Validation(format!(
            "Template id '{}' contains '{}'; use letters, digits, '-', '_' or '.'",
            id, bad
        )));
    }
    Ok(())
}

pub trait TemplateSource {
    fn fetch(&self, query: &TemplateQuery) -> Result<Vec<Template>>;

    fn get(&self, id: &str) -> Result<Template>;

    fn upload(&self, template: &TemplateUpload) -> Result<ApiResponse>;

    fn delete(&self, id: &str) -> Result<ApiResponse>;

    /// Human-readable location, for messages.
    fn describe(&self) -> String;
}

/// Result of [`fetch_with_fallback`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateFetch {
    pub templates: Vec<Template>,
    pub error: Option<String>,
    /// True when `templates` is the bundled list standing in for the remote one.
    pub fallback: bool,
}

pub fn fetch_with_fallback<T>(source: &T, query: &TemplateQuery) -> TemplateFetch
where
    T: TemplateSource + ?Sized,
{
    match source.fetch(query) {
        Ok(templates) => TemplateFetch {
            templates,
            error: None,
            fallback: false,
        },
        Err(e) if e.is_malformed_payload() || e.is_validation() => {
            warn!(source = %source.describe(), error = %e, "template fetch rejected");
            TemplateFetch {
                templates: Vec::new(),
                error: Some(e.to_string()),
                fallback: false,
            }
        }
        Err(e) => {
            warn!(source = %source.describe(), error = %e, "template source unavailable, using bundled templates");
            TemplateFetch {
                templates: query.apply(&builtin::builtin_templates()),
                error: Some(e.to_string()),
                fallback: true,
            }
        }
    }
}

/// The source named by the config's locator.
pub fn source_for_config(config: &StudioConfig) -> Box<dyn TemplateSource + Send + Sync> {
    if config.uses_builtin_templates() || !config.features.remote_templates {
        Box::new(builtin::BuiltinTemplates)
    } else {
        Box::new(http::HttpTemplateClient::new(
            &config.template_source_url,
            config.timeout_secs,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    enum Failure {
        Down,
        Status,
        Garbage,
    }

    struct BrokenSource(Failure);

    impl TemplateSource for BrokenSource {
        fn fetch(&self, _query: &TemplateQuery) -> Result<Vec<Template>> {
            match self.0 {
                Failure::Down => Err(StudioError::Http(ureq::Error::Io(std::io::Error::other(
                    "connection refused",
                )))),
                Failure::Status => Err(StudioError::HttpStatus {
                    status: 500,
                    body: "database down".to_string(),
                }),
                Failure::Garbage => {
                    let parsed: Vec<Template> = serde_json::from_str("{\"oops\": 1}")?;
                    Ok(parsed)
                }
            }
        }

        fn get(&self, id: &str) -> Result<Template> {
            Err(StudioError::TemplateNotFound(id.to_string()))
        }

        fn upload(&self, _template: &TemplateUpload) -> Result<ApiResponse> {
            Err(StudioError::Store("read-only".to_string()))
        }

        fn delete(&self, _id: &str) -> Result<ApiResponse> {
            Err(StudioError::Store("read-only".to_string()))
        }

        fn describe(&self) -> String {
            "broken".to_string()
        }
    }

    #[test]
    fn test_transport_failure_uses_bundled_templates() {
        let out = fetch_with_fallback(&BrokenSource(Failure::Down), &TemplateQuery::default());
        assert!(out.fallback);
        assert!(out.error.is_some());
        assert_eq!(out.templates, builtin::builtin_templates());
    }

    #[test]
    fn test_error_status_uses_bundled_templates() {
        let out = fetch_with_fallback(&BrokenSource(Failure::Status), &TemplateQuery::default());
        assert!(out.fallback);
        assert!(out.error.unwrap().contains("500"));
    }

    #[test]
    fn test_fallback_honours_query() {
        let query = TemplateQuery::in_category("architecture");
        let out = fetch_with_fallback(&BrokenSource(Failure::Down), &query);
        assert!(!out.templates.is_empty());
        assert!(out
            .templates
            .iter()
            .all(|t| t.category.as_deref() == Some("architecture")));
    }

    #[test]
    fn test_malformed_reply_is_empty_with_error() {
        let out = fetch_with_fallback(&BrokenSource(Failure::Garbage), &TemplateQuery::default());
        assert!(!out.fallback);
        assert!(out.templates.is_empty());
        assert!(out.error.is_some());
    }

    #[test]
    fn test_template_accepts_minimal_payload() {
        let json = r#"[{"id":"t1","name":"N","description":"D","content":"C","category":"general","created_at":null}]"#;
        let parsed: Vec<Template> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed[0].category.as_deref(), Some("general"));
        assert!(parsed[0].tags.is_empty());
        assert!(parsed[0].created_at.is_none());
    }

    #[test]
    fn test_upload_validation() {
        let good = TemplateUpload {
            id: "team-adr".to_string(),
            name: "ADR".to_string(),
            description: String::new(),
            content: "# ADR".to_string(),
        };
        assert!(good.validate().is_ok());

        let mut bad = good.clone();
        bad.id = String::new();
        assert!(bad.validate().unwrap_err().is_validation());

        let mut bad = good.clone();
        bad.id = "../x".to_string();
        assert!(bad.validate().is_err());

        let mut bad = good.clone();
        bad.name = " ".to_string();
        assert!(bad.validate().is_err());

        let mut bad = good;
        bad.content = String::new();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_query_validation_and_limits() {
        assert!(TemplateQuery::search("a").validate().is_err());
        assert!(TemplateQuery::search("设计").validate().is_ok());
        assert_eq!(TemplateQuery::search("api").effective_limit(), DEFAULT_SEARCH_LIMIT);
        assert_eq!(TemplateQuery::default().effective_limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn test_query_apply_paginates() {
        let all = builtin::builtin_templates();
        let query = TemplateQuery {
            skip: 1,
            limit: Some(2),
            ..TemplateQuery::default()
        };
        let page = query.apply(&all);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0], all[1]);
    }

    #[test]
    fn test_source_for_config() {
        let mut config = StudioConfig::default();
        assert_eq!(source_for_config(&config).describe(), "builtin:");

        config.template_source_url = "http://templates.local:8000".to_string();
        assert_eq!(
            source_for_config(&config).describe(),
            "http://templates.local:8000"
        );

        config.features.remote_templates = false;
        assert_eq!(source_for_config(&config).describe(), "builtin:");
    }
}
