use crate::commands::{CmdMessage, CmdResult};
use crate::error::{Result, StudioError};
use crate::model::{ReviewComment, Severity};
use crate::store::DocumentStore;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct NewComment {
    pub author: String,
    pub content: String,
    pub severity: Severity,
    pub file_path: Option<String>,
    pub line_number: Option<u32>,
}

pub fn add<S: DocumentStore>(store: &mut S, new: NewComment) -> Result<CmdResult> {
    if new.content.trim().is_empty() {
        return Err(StudioError::Validation(
            "Comment content cannot be empty".to_string(),
        ));
    }
    let author = if new.author.trim().is_empty() {
        "unknown".to_string()
    } else {
        new.author.trim().to_string()
    };

    let comment = ReviewComment::new(author, new.content, new.severity)
        .with_location(new.file_path, new.line_number);

    let mut comments = store.load_comments()?;
    comments.push(comment.clone());
    store.save_comments(&comments)?;

    let mut result = CmdResult::default().with_comments(vec![comment]);
    result.add_message(CmdMessage::success(format!(
        "Added comment ({} total)",
        comments.len()
    )));
    Ok(result)
}

pub fn list<S: DocumentStore>(store: &S) -> Result<CmdResult> {
    let comments = store.load_comments()?;
    let mut result = CmdResult::default();
    if comments.is_empty() {
        result.add_message(CmdMessage::info("No review comments."));
    }
    Ok(result.with_comments(comments))
}

pub fn clear<S: DocumentStore>(store: &mut S) -> Result<CmdResult> {
    let count = store.load_comments()?.len();
    store.save_comments(&[])?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Cleared {} comments", count)));
    Ok(result)
}

/// Append comments from a JSON array of comment records.
///
/// A payload that does not parse imports nothing and yields a warning.
pub fn import<S: DocumentStore>(store: &mut S, payload: &str) -> Result<CmdResult> {
    let incoming: Vec<ReviewComment> = match serde_json::from_str(payload) {
        Ok(comments) => comments,
        Err(e) => {
            warn!(error = %e, "comment payload did not parse");
            let mut result = CmdResult::default();
            result.add_message(CmdMessage::warning(format!(
                "Could not read comments, nothing imported: {}",
                e
            )));
            return Ok(result);
        }
    };

    let mut comments = store.load_comments()?;
    let before = comments.len();
    for comment in &incoming {
        if !comments.iter().any(|c| c.id == comment.id) {
            comments.push(comment.clone());
        }
    }
    let added = comments.len() - before;
    store.save_comments(&comments)?;

    let mut result = CmdResult::default().with_comments(incoming.clone());
    let skipped = incoming.len() - added;
    if skipped > 0 {
        result.add_message(CmdMessage::info(format!(
            "Skipped {} comments already present",
            skipped
        )));
    }
    result.add_message(CmdMessage::success(format!("Imported {} comments", added)));
    Ok(result)
}
