//! Review comments as error/fix pairs for retrieval-augmented prompts.

use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{RagPair, ReviewComment};
use crate::store::DocumentStore;
use std::fs;
use std::path::Path;

pub const EXPORT_FILE: &str = "rag_review_data.json";

const FIX_MARKERS: &[&str] = &["建议", "fix", "should"];
const DEFAULT_FIX: &str = "Review the issue described above and fix the code accordingly.";
/// Error text longer than this (in bytes) is split in two when no fix marker was found.
const SPLIT_THRESHOLD: usize = 50;

/// Split a comment into (error description, fix suggestion).
///
/// Lines belong to the description until the first line mentioning a fix
/// marker; that line and everything after it is the suggestion.
pub fn split_comment(content: &str) -> (String, String) {
    let mut error_logic = String::new();
    let mut fix_suggestion = String::new();
    let mut in_fix = false;

    for line in content.lines() {
        let lower = line.to_lowercase();
        if FIX_MARKERS.iter().any(|m| lower.contains(m)) {
            in_fix = true;
        }

        let target = if in_fix {
            &mut fix_suggestion
        } else {
            &mut error_logic
        };
        if !target.is_empty() {
            target.push(' ');
        }
        target.push_str(line.trim());
    }

    if fix_suggestion.is_empty() && error_logic.len() > SPLIT_THRESHOLD {
        let mut mid = error_logic.len() / 2;
        while !error_logic.is_char_boundary(mid) {
            mid += 1;
        }
        let split_at = error_logic[mid..]
            .find(' ')
            .map(|offset| mid + offset)
            .unwrap_or(mid);
        fix_suggestion = error_logic.split_off(split_at).trim().to_string();
    }

    if error_logic.is_empty() {
        error_logic = content.to_string();
    }
    if fix_suggestion.is_empty() {
        fix_suggestion = DEFAULT_FIX.to_string();
    }

    (error_logic, fix_suggestion)
}

pub fn to_pair(comment: &ReviewComment) -> RagPair {
    let (error_logic, fix_suggestion) = split_comment(&comment.content);
    RagPair {
        error_logic,
        fix_suggestion,
        source_comment: comment.clone(),
    }
}

/// Rebuild the pair list from the current comments.
pub fn process<S: DocumentStore>(store: &mut S) -> Result<CmdResult> {
    let comments = store.load_comments()?;
    let pairs: Vec<RagPair> = comments.iter().map(to_pair).collect();
    store.save_rag_pairs(&pairs)?;

    let mut result = CmdResult::default().with_rag_pairs(pairs);
    result.add_message(CmdMessage::success(format!(
        "Processed {} comments",
        comments.len()
    )));
    Ok(result)
}

pub fn list<S: DocumentStore>(store: &S) -> Result<CmdResult> {
    let pairs = store.load_rag_pairs()?;
    let mut result = CmdResult::default();
    if pairs.is_empty() {
        result.add_message(CmdMessage::info(
            "No RAG pairs. Run `flowstudio rag process` first.",
        ));
    }
    Ok(result.with_rag_pairs(pairs))
}

/// Write the pairs to `<dir>/rag_review_data.json`.
pub fn export<S: DocumentStore>(store: &S, dir: &Path) -> Result<CmdResult> {
    let pairs = store.load_rag_pairs()?;
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    let target = dir.join(EXPORT_FILE);
    let content = serde_json::to_string_pretty(&pairs)?;
    fs::write(&target, content)?;

    let mut result = CmdResult::default().with_paths(vec![target.clone()]);
    result.add_message(CmdMessage::success(format!(
        "Exported {} pairs to {}",
        pairs.len(),
        target.display()
    )));
    Ok(result)
}
