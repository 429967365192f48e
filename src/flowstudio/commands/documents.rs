use crate::commands::{CmdMessage, CmdResult};
use crate::error::{Result, StudioError};
use crate::model::{Document, validate_document_name};
use crate::store::{DOCUMENT_EXT, DocumentStore};
use chrono::Utc;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::info;

pub fn save<S: DocumentStore>(store: &mut S, name: &str, content: &str) -> Result<CmdResult> {
    let document = Document::new(name, content);
    store.save_document(&document)?;
    let path = store.document_path(name)?;
    info!(name, "document saved");

    let mut result = CmdResult::default().with_paths(vec![path.clone()]);
    result.add_message(CmdMessage::success(format!(
        "Saved {} ({} bytes) to {}",
        name,
        content.len(),
        path.display()
    )));
    Ok(result)
}

pub fn load<S: DocumentStore>(store: &S, name: &str) -> Result<CmdResult> {
    let document = store.load_document(name)?;
    Ok(CmdResult::default().with_document(document))
}

pub fn list<S: DocumentStore>(store: &S) -> Result<CmdResult> {
    let documents = store.list_documents()?;
    let mut result = CmdResult::default();
    if documents.is_empty() {
        result.add_message(CmdMessage::info("No documents yet."));
    }
    Ok(result.with_documents(documents))
}

pub fn delete<S: DocumentStore>(store: &mut S, name: &str) -> Result<CmdResult> {
    store.delete_document(name)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Deleted {}", name)));
    Ok(result)
}

/// Does a document with this name exist?
pub fn exists<S: DocumentStore>(store: &S, name: &str) -> Result<bool> {
    match store.load_document(name) {
        Ok(_) => Ok(true),
        Err(StudioError::DocumentNotFound(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Copy one document to `<dir>/<name>.md`.
pub fn export<S: DocumentStore>(store: &S, name: &str, dir: &Path) -> Result<CmdResult> {
    let document = store.load_document(name)?;
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    let target = dir.join(format!("{}.{}", name, DOCUMENT_EXT));
    fs::write(&target, &document.content)?;

    let mut result = CmdResult::default().with_paths(vec![target.clone()]);
    result.add_message(CmdMessage::success(format!(
        "Exported {} to {}",
        name,
        target.display()
    )));
    Ok(result)
}

/// Bundle every document into `<dir>/flowstudio-<timestamp>.tar.gz`.
pub fn archive<S: DocumentStore>(store: &S, dir: &Path) -> Result<CmdResult> {
    let summaries = store.list_documents()?;

    if summaries.is_empty() {
        let mut res = CmdResult::default();
        res.add_message(CmdMessage::info("No documents to archive."));
        return Ok(res);
    }

    let mut documents = Vec::with_capacity(summaries.len());
    for summary in &summaries {
        documents.push(store.load_document(&summary.name)?);
    }

    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    let filename = format!("flowstudio-{}.tar.gz", Utc::now().format("%Y-%m-%d_%H-%M-%S"));
    let target = dir.join(filename);
    let file = File::create(&target)?;
    write_archive(file, &documents)?;

    let mut result = CmdResult::default().with_paths(vec![target.clone()]);
    result.add_message(CmdMessage::success(format!(
        "Archived {} documents to {}",
        documents.len(),
        target.display()
    )));
    Ok(result)
}

fn write_archive<W: Write>(writer: W, documents: &[Document]) -> Result<()> {
    let enc = GzEncoder::new(writer, Compression::default());
    let mut tar = tar::Builder::new(enc);

    for document in documents {
        // Entry names must stay inside documents/
        validate_document_name(&document.name)?;
        let entry_name = format!("documents/{}.{}", document.name, DOCUMENT_EXT);

        let mut header = tar::Header::new_gnu();
        header.set_size(document.content.len() as u64);
        header.set_mode(0o644);
        if let Some(modified) = document.modified_at {
            header.set_mtime(modified.timestamp().max(0) as u64);
        }
        header.set_cksum();

        tar.append_data(&mut header, entry_name, document.content.as_bytes())?;
    }

    tar.into_inner()?.finish()?;
    Ok(())
}
