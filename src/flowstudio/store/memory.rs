use super::{DOCUMENT_EXT, DocumentStore};
use crate::error::{Result, StudioError};
use crate::model::{
    Document, DocumentSummary, MetricData, RagPair, ReviewComment, validate_document_name,
};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Default)]
pub struct InMemoryStore {
    documents: BTreeMap<String, Document>,
    comments: Vec<ReviewComment>,
    rag_pairs: Vec<RagPair>,
    metrics: Vec<MetricData>,
    simulate_write_error: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with an IO error.
    pub fn set_simulate_write_error(&mut self, fail: bool) {
        self.simulate_write_error = fail;
    }

    fn check_write(&self) -> Result<()> {
        if self.simulate_write_error {
            return Err(StudioError::Io(std::io::Error::other(
                "Simulated write error",
            )));
        }
        Ok(())
    }
}

impl DocumentStore for InMemoryStore {
    fn save_document(&mut self, document: &Document) -> Result<()> {
        validate_document_name(&document.name)?;
        self.check_write()?;
        let mut stored = document.clone();
        stored.modified_at = Some(Utc::now());
        self.documents.insert(stored.name.clone(), stored);
        Ok(())
    }

    fn load_document(&self, name: &str) -> Result<Document> {
        validate_document_name(name)?;
        self.documents
            .get(name)
            .cloned()
            .ok_or_else(|| StudioError::DocumentNotFound(name.to_string()))
    }

    fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        // BTreeMap iterates in name order
        Ok(self
            .documents
            .values()
            .map(|d| DocumentSummary {
                name: d.name.clone(),
                modified_at: d.modified_at,
                size: d.content.len() as u64,
            })
            .collect())
    }

    fn delete_document(&mut self, name: &str) -> Result<()> {
        validate_document_name(name)?;
        self.check_write()?;
        self.documents
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StudioError::DocumentNotFound(name.to_string()))
    }

    fn document_path(&self, name: &str) -> Result<PathBuf> {
        validate_document_name(name)?;
        Ok(PathBuf::from(format!("{}.{}", name, DOCUMENT_EXT)))
    }

    fn load_comments(&self) -> Result<Vec<ReviewComment>> {
        Ok(self.comments.clone())
    }

    fn save_comments(&mut self, comments: &[ReviewComment]) -> Result<()> {
        self.check_write()?;
        self.comments = comments.to_vec();
        Ok(())
    }

    fn load_rag_pairs(&self) -> Result<Vec<RagPair>> {
        Ok(self.rag_pairs.clone())
    }

    fn save_rag_pairs(&mut self, pairs: &[RagPair]) -> Result<()> {
        self.check_write()?;
        self.rag_pairs = pairs.to_vec();
        Ok(())
    }

    fn load_metrics(&self) -> Result<Vec<MetricData>> {
        Ok(self.metrics.clone())
    }

    fn save_metrics(&mut self, metrics: &[MetricData]) -> Result<()> {
        self.check_write()?;
        self.metrics = metrics.to_vec();
        Ok(())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::Severity;

    pub struct StoreFixture {
        pub store: InMemoryStore,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
            }
        }

        pub fn with_documents(mut self, count: usize) -> Self {
            for i in 0..count {
                let doc = Document::new(
                    format!("doc-{}", i + 1),
                    format!("# Document {}\n\nBody {}", i + 1, i + 1),
                );
                self.store.save_document(&doc).unwrap();
            }
            self
        }

        pub fn with_document(mut self, name: &str, content: &str) -> Self {
            self.store
                .save_document(&Document::new(name, content))
                .unwrap();
            self
        }

        pub fn with_comment(mut self, content: &str, severity: Severity) -> Self {
            let mut comments = self.store.load_comments().unwrap();
            comments.push(ReviewComment::new("reviewer", content, severity));
            self.store.save_comments(&comments).unwrap();
            self
        }
    }
}
