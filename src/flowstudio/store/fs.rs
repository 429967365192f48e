use super::{DOCUMENT_EXT, DocumentStore};
use crate::error::{Result, StudioError};
use crate::model::{
    Document, DocumentSummary, MetricData, RagPair, ReviewComment, validate_document_name,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

pub const COMMENTS_FILE: &str = "reviews.json";
pub const RAG_PAIRS_FILE: &str = "rag_pairs.json";
pub const METRICS_FILE: &str = "metrics.json";

pub struct FileStore {
    documents_dir: PathBuf,
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(documents_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            documents_dir,
            data_dir,
        }
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn ensure_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    fn document_file(&self, name: &str) -> Result<PathBuf> {
        validate_document_name(name)?;
        Ok(self
            .documents_dir
            .join(format!("{}.{}", name, DOCUMENT_EXT)))
    }

    fn load_collection<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.data_dir.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let items: Vec<T> = serde_json::from_str(&content)?;
        Ok(items)
    }

    fn save_collection<T: Serialize>(&self, file: &str, items: &[T]) -> Result<()> {
        Self::ensure_dir(&self.data_dir)?;
        let content = serde_json::to_string_pretty(items)?;
        write_atomic(&self.data_dir.join(file), content.as_bytes())
    }
}

/// Write to a sibling temp file, then rename over the target.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| StudioError::Store(format!("No parent directory for {}", path.display())))?;
    let tmp_path = dir.join(format!(".flowstudio-{}.tmp", Uuid::new_v4()));
    if let Err(e) = fs::write(&tmp_path, bytes) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

fn modified_at(meta: &fs::Metadata) -> Option<DateTime<Utc>> {
    meta.modified().ok().map(DateTime::<Utc>::from)
}

impl DocumentStore for FileStore {
    fn save_document(&mut self, document: &Document) -> Result<()> {
        let path = self.document_file(&document.name)?;
        Self::ensure_dir(&self.documents_dir)?;
        write_atomic(&path, document.content.as_bytes())?;
        debug!(path = %path.display(), bytes = document.content.len(), "document written");
        Ok(())
    }

    fn load_document(&self, name: &str) -> Result<Document> {
        let path = self.document_file(name)?;
        if !path.is_file() {
            return Err(StudioError::DocumentNotFound(name.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        let modified = fs::metadata(&path).ok().as_ref().and_then(modified_at);

        Ok(Document {
            name: name.to_string(),
            content,
            modified_at: modified,
        })
    }

    fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        if !self.documents_dir.exists() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.documents_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXT) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_document_name(name).is_err() {
                continue;
            }
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            summaries.push(DocumentSummary {
                name: name.to_string(),
                modified_at: modified_at(&meta),
                size: meta.len(),
            });
        }

        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    fn delete_document(&mut self, name: &str) -> Result<()> {
        let path = self.document_file(name)?;
        if !path.is_file() {
            return Err(StudioError::DocumentNotFound(name.to_string()));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    fn document_path(&self, name: &str) -> Result<PathBuf> {
        self.document_file(name)
    }

    fn load_comments(&self) -> Result<Vec<ReviewComment>> {
        self.load_collection(COMMENTS_FILE)
    }

    fn save_comments(&mut self, comments: &[ReviewComment]) -> Result<()> {
        self.save_collection(COMMENTS_FILE, comments)
    }

    fn load_rag_pairs(&self) -> Result<Vec<RagPair>> {
        self.load_collection(RAG_PAIRS_FILE)
    }

    fn save_rag_pairs(&mut self, pairs: &[RagPair]) -> Result<()> {
        self.save_collection(RAG_PAIRS_FILE, pairs)
    }

    fn load_metrics(&self) -> Result<Vec<MetricData>> {
        self.load_collection(METRICS_FILE)
    }

    fn save_metrics(&mut self, metrics: &[MetricData]) -> Result<()> {
        self.save_collection(METRICS_FILE, metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("docs"), dir.path().join("data"));
        (dir, store)
    }

    #[test]
    fn test_save_and_load_document() {
        let (_dir, mut store) = setup();
        let doc = Document::new("notes", "# Notes\n\nbody");
        store.save_document(&doc).unwrap();

        let path = store.document_path("notes").unwrap();
        assert!(path.ends_with("docs/notes.md"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Notes\n\nbody");

        let loaded = store.load_document("notes").unwrap();
        assert_eq!(loaded.content, doc.content);
        assert!(loaded.modified_at.is_some());
    }

    #[test]
    fn test_overwrite_leaves_no_temp_files() {
        let (_dir, mut store) = setup();
        store.save_document(&Document::new("a", "one")).unwrap();
        store.save_document(&Document::new("a", "two")).unwrap();

        assert_eq!(store.load_document("a").unwrap().content, "two");
        let leftovers: Vec<_> = fs::read_dir(store.documents_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_list_documents_sorted_and_filtered() {
        let (_dir, mut store) = setup();
        store.save_document(&Document::new("zeta", "zz")).unwrap();
        store.save_document(&Document::new("alpha", "a")).unwrap();
        fs::write(store.documents_dir().join("readme.txt"), "not markdown").unwrap();
        fs::create_dir(store.documents_dir().join("folder.md")).unwrap();

        let docs = store.list_documents().unwrap();
        let names: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(docs[1].size, 2);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let (_dir, store) = setup();
        assert!(store.list_documents().unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_document() {
        let (_dir, store) = setup();
        match store.load_document("ghost") {
            Err(StudioError::DocumentNotFound(name)) => assert_eq!(name, "ghost"),
            other => panic!("Expected DocumentNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_name_never_touches_disk() {
        let (dir, mut store) = setup();
        let err = store
            .save_document(&Document::new("../escape", "x"))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(!dir.path().join("escape.md").exists());
    }

    #[test]
    fn test_delete_document() {
        let (_dir, mut store) = setup();
        store.save_document(&Document::new("gone", "x")).unwrap();
        store.delete_document("gone").unwrap();
        assert!(store.list_documents().unwrap().is_empty());
        assert!(matches!(
            store.delete_document("gone"),
            Err(StudioError::DocumentNotFound(_))
        ));
    }

    #[test]
    fn test_collections_roundtrip() {
        let (_dir, mut store) = setup();
        assert!(store.load_comments().unwrap().is_empty());

        let comment = ReviewComment::new("bob", "Missing null check", Severity::Critical);
        store.save_comments(std::slice::from_ref(&comment)).unwrap();
        assert_eq!(store.load_comments().unwrap(), vec![comment]);

        let metric = MetricData {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ai_generate_time_minutes: 12.5,
            ai_lines_of_code: 300,
            manual_lines_of_code: 100,
            review_comments_count: 4,
            resolved_comments_count: 3,
        };
        store.save_metrics(std::slice::from_ref(&metric)).unwrap();
        assert_eq!(store.load_metrics().unwrap(), vec![metric]);
        assert!(store.data_dir().join(METRICS_FILE).exists());
    }

    #[test]
    fn test_corrupt_collection_is_error() {
        let (_dir, store) = setup();
        fs::create_dir_all(store.data_dir()).unwrap();
        fs::write(store.data_dir().join(COMMENTS_FILE), "[{oops").unwrap();
        assert!(store.load_comments().unwrap_err().is_malformed_payload());
    }
}
