//! # Storage Layer
//!
//! The [`DocumentStore`] trait is everything the commands need to persist:
//! Markdown documents plus three JSON collections (review comments, RAG pairs,
//! metrics).
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: production storage
//!   - Documents as `<documents dir>/<name>.md`, content only
//!   - Collections as JSON arrays in the data directory
//!   - Every write goes to a temp file first and is renamed into place
//!
//! - [`memory::InMemoryStore`]: in-memory storage for tests
//!   - No persistence
//!   - Can simulate write failures
//!
//! ## Storage Format
//!
//! For `FileStore`:
//! ```text
//! <data dir>/
//! ├── config.json
//! ├── reviews.json       # ReviewComment array
//! ├── rag_pairs.json     # RagPair array
//! └── metrics.json       # MetricData array
//!
//! <documents dir>/
//! └── {name}.md
//! ```
//!
//! Documents live apart from the data directory so they can sit in a folder the
//! user browses, such as `~/Documents/AI_Flow_Studio`.

use crate::error::Result;
use crate::model::{Document, DocumentSummary, MetricData, RagPair, ReviewComment};
use std::path::PathBuf;

pub mod fs;
pub mod memory;

pub const DOCUMENT_EXT: &str = "md";

/// Abstract interface for document and collection storage.
pub trait DocumentStore {
    /// Create or overwrite a document.
    fn save_document(&mut self, document: &Document) -> Result<()>;

    fn load_document(&self, name: &str) -> Result<Document>;

    /// Summaries of all documents, sorted by name.
    fn list_documents(&self) -> Result<Vec<DocumentSummary>>;

    fn delete_document(&mut self, name: &str) -> Result<()>;

    /// Where the document lives (or would live) on disk.
    fn document_path(&self, name: &str) -> Result<PathBuf>;

    fn load_comments(&self) -> Result<Vec<ReviewComment>>;
    fn save_comments(&mut self, comments: &[ReviewComment]) -> Result<()>;

    fn load_rag_pairs(&self) -> Result<Vec<RagPair>>;
    fn save_rag_pairs(&mut self, pairs: &[RagPair]) -> Result<()>;

    fn load_metrics(&self) -> Result<Vec<MetricData>>;
    fn save_metrics(&mut self, metrics: &[MetricData]) -> Result<()>;
}
