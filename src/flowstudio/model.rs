use crate::error::{Result, StudioError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A Markdown document, persisted as `<name>.md`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub content: String,
    // Only stores backed by a real filesystem know this
    pub modified_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            modified_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub name: String,
    pub modified_at: Option<DateTime<Utc>>,
    pub size: u64,
}

/// Document names map 1:1 to file names, so anything that could escape the
/// documents directory is rejected.
pub fn validate_document_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StudioError::Validation(
            "Document name cannot be empty".to_string(),
        ));
    }
    if trimmed != name {
        return Err(StudioError::Validation(format!(
            "Document name has leading or trailing whitespace: '{}'",
            name
        )));
    }
    if name.starts_with('.') {
        return Err(StudioError::Validation(format!(
            "Document name cannot start with '.': '{}'",
            name
        )));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(StudioError::Validation(format!(
            "Document name cannot contain path separators: '{}'",
            name
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    #[default]
    Suggestion,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Suggestion => "suggestion",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "warning" => Ok(Severity::Warning),
            "suggestion" => Ok(Severity::Suggestion),
            other => Err(format!(
                "Unknown severity '{}' (expected critical, warning or suggestion)",
                other
            )),
        }
    }
}

/// A code review remark, as captured from a merge request page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub id: String,
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub line_number: Option<u32>,
    #[serde(default)]
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

impl ReviewComment {
    pub fn new(author: impl Into<String>, content: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: format!("comment_{}", Uuid::new_v4()),
            author: author.into(),
            content: content.into(),
            file_path: None,
            line_number: None,
            severity,
            created_at: Utc::now(),
        }
    }

    pub fn with_location(mut self, file_path: Option<String>, line_number: Option<u32>) -> Self {
        self.file_path = file_path;
        self.line_number = line_number;
        self
    }
}

/// Error/fix pair derived from a review comment, for retrieval-augmented prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagPair {
    pub error_logic: String,
    pub fix_suggestion: String,
    pub source_comment: ReviewComment,
}

/// One working session's productivity numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricData {
    pub date: NaiveDate,
    pub ai_generate_time_minutes: f64,
    pub ai_lines_of_code: u32,
    pub manual_lines_of_code: u32,
    pub review_comments_count: u32,
    pub resolved_comments_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_sessions: usize,
    pub avg_ai_time: f64,
    pub total_ai_lines: f64,
    pub total_manual_lines: f64,
    /// Share of AI-written lines, in percent.
    pub ai_efficiency: f64,
    pub total_reviews: f64,
    /// Share of resolved review comments, in percent.
    pub resolved_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_document_name() {
        assert!(validate_document_name("design-notes").is_ok());
        assert!(validate_document_name("设计文档").is_ok());
        assert!(validate_document_name("").unwrap_err().is_validation());
        assert!(validate_document_name("  ").is_err());
        assert!(validate_document_name("../etc/passwd").is_err());
        assert!(validate_document_name("a/b").is_err());
        assert!(validate_document_name("a\\b").is_err());
        assert!(validate_document_name(".hidden").is_err());
        assert!(validate_document_name(" padded").is_err());
    }

    #[test]
    fn test_severity_parse_and_display() {
        assert_eq!("Critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warning);
        assert!("blocker".parse::<Severity>().is_err());
        assert_eq!(Severity::Suggestion.to_string(), "suggestion");
    }

    #[test]
    fn test_comment_deserializes_capture_payload() {
        let json = r#"{
            "id": "comment_0_1700000000000",
            "author": "alice",
            "content": "Null check missing",
            "file_path": null,
            "line_number": 42,
            "severity": "critical",
            "created_at": "2024-01-15T10:30:00.000Z"
        }"#;
        let comment: ReviewComment = serde_json::from_str(json).unwrap();
        assert_eq!(comment.author, "alice");
        assert_eq!(comment.line_number, Some(42));
        assert_eq!(comment.severity, Severity::Critical);
    }

    #[test]
    fn test_comment_ids_are_unique() {
        let a = ReviewComment::new("a", "x", Severity::Warning);
        let b = ReviewComment::new("a", "x", Severity::Warning);
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("comment_"));
    }
}
