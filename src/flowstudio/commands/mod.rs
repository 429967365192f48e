use crate::ai::GeneratedDiagram;
use crate::config::StudioConfig;
use crate::model::{Document, DocumentSummary, MetricData, MetricsSummary, RagPair, ReviewComment};
use crate::templates::Template;
use std::path::PathBuf;

pub mod config;
pub mod diagram;
pub mod documents;
pub mod metrics;
pub mod rag;
pub mod reviews;
pub mod templates;

/// Where FlowStudio keeps its files.
#[derive(Debug, Clone)]
pub struct StudioPaths {
    /// Config and JSON collections.
    pub data: PathBuf,
    /// Markdown documents.
    pub documents: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// A diagram block turned into a render token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiagram {
    /// 1-based position in the source document, 0 for standalone text.
    pub index: usize,
    pub token: String,
    /// Absent when previews are switched off.
    pub url: Option<String>,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub documents: Vec<DocumentSummary>,
    pub document: Option<Document>,
    pub comments: Vec<ReviewComment>,
    pub rag_pairs: Vec<RagPair>,
    pub metrics: Vec<MetricData>,
    pub summary: Option<MetricsSummary>,
    pub diagrams: Vec<RenderedDiagram>,
    pub generated: Option<GeneratedDiagram>,
    /// Plain text output, such as a decoded diagram.
    pub text: Option<String>,
    pub templates: Vec<Template>,
    pub paths: Vec<PathBuf>,
    pub config: Option<StudioConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_documents(mut self, documents: Vec<DocumentSummary>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_comments(mut self, comments: Vec<ReviewComment>) -> Self {
        self.comments = comments;
        self
    }

    pub fn with_rag_pairs(mut self, pairs: Vec<RagPair>) -> Self {
        self.rag_pairs = pairs;
        self
    }

    pub fn with_metrics(mut self, metrics: Vec<MetricData>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_summary(mut self, summary: MetricsSummary) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn with_diagrams(mut self, diagrams: Vec<RenderedDiagram>) -> Self {
        self.diagrams = diagrams;
        self
    }

    pub fn with_text(mut self, text: String) -> Self {
        self.text = Some(text);
        self
    }

    pub fn with_templates(mut self, templates: Vec<Template>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_config(mut self, config: StudioConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.level == MessageLevel::Error)
    }
}
