//! Locating diagram sources inside Markdown documents.
//!
//! The editor renders fenced blocks tagged `plantuml`, `puml` or `uml` as
//! images. Anything else is left as a regular code block.

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};

const DIAGRAM_LANGUAGES: &[&str] = &["plantuml", "puml", "uml"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramBlock {
    /// Position among the document's diagram blocks, starting at 1.
    pub index: usize,
    pub language: String,
    pub source: String,
}

fn diagram_language(info: &str) -> Option<&str> {
    // Info strings can carry attributes after the language: "plantuml {width=50%}"
    let lang = info.split_whitespace().next()?;
    DIAGRAM_LANGUAGES
        .iter()
        .find(|known| known.eq_ignore_ascii_case(lang))
        .copied()
}

pub fn diagram_blocks(markdown: &str) -> Vec<DiagramBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<(String, String)> = None;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                if let Some(lang) = diagram_language(&info) {
                    current = Some((lang.to_string(), String::new()));
                }
            }
            Event::Text(text) => {
                if let Some((_, source)) = current.as_mut() {
                    source.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, source)) = current.take() {
                    blocks.push(DiagramBlock {
                        index: blocks.len() + 1,
                        language,
                        source: source.trim_end().to_string(),
                    });
                }
            }
            _ => {}
        }
    }

    blocks
}
