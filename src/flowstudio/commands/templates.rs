use crate::commands::documents;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{Result, StudioError};
use crate::model::Document;
use crate::store::DocumentStore;
use crate::templates::{
    TemplateQuery, TemplateSource, TemplateUpload, fetch_with_fallback,
};

/// List or search templates. Never fails: problems become messages.
pub fn fetch<T>(source: &T, query: &TemplateQuery) -> Result<CmdResult>
where
    T: TemplateSource + ?Sized,
{
    let outcome = fetch_with_fallback(source, query);
    let mut result = CmdResult::default();

    match (&outcome.error, outcome.fallback) {
        (Some(e), true) => result.add_message(CmdMessage::warning(format!(
            "{} is unavailable ({}); showing bundled templates",
            source.describe(),
            e
        ))),
        (Some(e), false) => result.add_message(CmdMessage::error(e.clone())),
        (None, _) if outcome.templates.is_empty() => {
            result.add_message(CmdMessage::info("No templates found."))
        }
        (None, _) => {}
    }

    Ok(result.with_templates(outcome.templates))
}

pub fn show<T>(source: &T, id: &str) -> Result<CmdResult>
where
    T: TemplateSource + ?Sized,
{
    let template = source.get(id)?;
    Ok(CmdResult::default().with_templates(vec![template]))
}

pub fn upload<T>(source: &T, template: &TemplateUpload) -> Result<CmdResult>
where
    T: TemplateSource + ?Sized,
{
    let reply = source.upload(template)?;
    let mut result = CmdResult::default();
    if reply.success {
        result.add_message(CmdMessage::success(reply.message));
    } else {
        result.add_message(CmdMessage::error(reply.message));
    }
    Ok(result)
}

pub fn delete<T>(source: &T, id: &str) -> Result<CmdResult>
where
    T: TemplateSource + ?Sized,
{
    let reply = source.delete(id)?;
    let mut result = CmdResult::default();
    if reply.success {
        result.add_message(CmdMessage::success(reply.message));
    } else {
        result.add_message(CmdMessage::error(reply.message));
    }
    Ok(result)
}

/// Start a new document from a template.
///
/// The document is named after the template unless `name` is given. An existing
/// document is only replaced when `overwrite` is set.
pub fn apply<S, T>(
    store: &mut S,
    source: &T,
    id: &str,
    name: Option<&str>,
    overwrite: bool,
) -> Result<CmdResult>
where
    S: DocumentStore,
    T: TemplateSource + ?Sized,
{
    let template = source.get(id)?;
    let name = name.unwrap_or(&template.id);

    if !overwrite && documents::exists(store, name)? {
        return Err(StudioError::Validation(format!(
            "Document '{}' already exists; pass --force to replace it",
            name
        )));
    }

    store.save_document(&Document::new(name, template.content.clone()))?;
    let path = store.document_path(name)?;

    let mut result = CmdResult::default()
        .with_templates(vec![template.clone()])
        .with_paths(vec![path]);
    result.add_message(CmdMessage::success(format!(
        "Created {} from template '{}'",
        name, template.name
    )));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::store::memory::InMemoryStore;
    use crate::templates::builtin::BuiltinTemplates;
    use crate::templates::http::HttpTemplateClient;

    #[test]
    fn test_fetch_builtin() {
        let res = fetch(&BuiltinTemplates, &TemplateQuery::default()).unwrap();
        assert!(!res.templates.is_empty());
        assert!(res.messages.is_empty());
    }

    #[test]
    fn test_fetch_short_search_is_error_message() {
        let res = fetch(&BuiltinTemplates, &TemplateQuery::search("a")).unwrap();
        assert!(res.templates.is_empty());
        assert_eq!(res.messages[0].level, MessageLevel::Error);
    }

    #[test]
    fn test_fetch_unreachable_warns() {
        let client = HttpTemplateClient::new("http://127.0.0.1:9", 2);
        let res = fetch(&client, &TemplateQuery::default()).unwrap();
        assert!(!res.templates.is_empty());
        assert_eq!(res.messages[0].level, MessageLevel::Warning);
    }

    #[test]
    fn test_apply_creates_document() {
        let mut store = InMemoryStore::new();
        let res = apply(&mut store, &BuiltinTemplates, "prd", None, false).unwrap();
        assert_eq!(res.paths.len(), 1);
        let doc = store.load_document("prd").unwrap();
        assert!(doc.content.starts_with("# Product Requirements"));
    }

    #[test]
    fn test_apply_refuses_overwrite() {
        let mut store = InMemoryStore::new();
        apply(&mut store, &BuiltinTemplates, "prd", Some("plan"), false).unwrap();
        let err = apply(&mut store, &BuiltinTemplates, "api-design", Some("plan"), false)
            .unwrap_err();
        assert!(err.is_validation());

        apply(&mut store, &BuiltinTemplates, "api-design", Some("plan"), true).unwrap();
        assert!(store
            .load_document("plan")
            .unwrap()
            .content
            .starts_with("# API Design"));
    }

    #[test]
    fn test_apply_unknown_template() {
        let mut store = InMemoryStore::new();
        assert!(matches!(
            apply(&mut store, &BuiltinTemplates, "nope", None, false),
            Err(StudioError::TemplateNotFound(_))
        ));
    }
}
