//! # Async Host Commands
//!
//! The editor UI talks to the host through asynchronous request/response
//! calls. [`HostCommands`] is that boundary: each method returns a future that
//! resolves to a typed `Result`, never panics across the boundary and never
//! retries on its own.
//!
//! Everything underneath is synchronous (`ureq`, `std::fs`), so each call runs
//! on tokio's blocking pool. Store access is serialized behind a mutex;
//! generator and template calls do not hold it while they wait on the network.
//!
//! Fallback selection stays with the caller, with two exceptions that mirror
//! the editor's behaviour: diagram generation may return a canned diagram (see
//! [`crate::ai::generate_with_fallback`]) and template fetching always returns
//! a [`TemplateFetch`].

use crate::ai::{DiagramGenerator, GeneratedDiagram, generate_with_fallback};
use crate::api::StudioApi;
use crate::error::{Result, StudioError};
use crate::model::{Document, DocumentSummary};
use crate::store::DocumentStore;
use crate::templates::{
    ApiResponse, TemplateFetch, TemplateQuery, TemplateSource, TemplateUpload, fetch_with_fallback,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

async fn run_blocking<F, R>(task: F) -> Result<R>
where
    F: FnOnce() -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| StudioError::Task(e.to_string()))?
}

pub struct HostCommands<S, G: ?Sized, T: ?Sized>
where
    S: DocumentStore,
{
    api: Arc<Mutex<StudioApi<S>>>,
    generator: Arc<G>,
    templates: Arc<T>,
}

impl<S, G: ?Sized, T: ?Sized> Clone for HostCommands<S, G, T>
where
    S: DocumentStore,
{
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            generator: Arc::clone(&self.generator),
            templates: Arc::clone(&self.templates),
        }
    }
}

impl<S, G, T> HostCommands<S, G, T>
where
    S: DocumentStore + Send + 'static,
    G: DiagramGenerator + Send + Sync + ?Sized + 'static,
    T: TemplateSource + Send + Sync + ?Sized + 'static,
{
    pub fn new(api: StudioApi<S>, generator: Arc<G>, templates: Arc<T>) -> Self {
        Self {
            api: Arc::new(Mutex::new(api)),
            generator,
            templates,
        }
    }

    async fn with_api<F, R>(&self, op: &'static str, f: F) -> Result<R>
    where
        F: FnOnce(&mut StudioApi<S>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let api = Arc::clone(&self.api);
        run_blocking(move || {
            let mut guard = api
                .lock()
                .map_err(|_| StudioError::Task("studio state lock poisoned".to_string()))?;
            f(&mut guard)
        })
        .await
        .inspect_err(|e| error!(op = op, error = %e, "host command failed"))
    }

    /// Write a document; resolves to its path.
    pub async fn persist_document(&self, name: String, content: String) -> Result<PathBuf> {
        self.with_api("persist_document", move |api| {
            let result = api.save_document(&name, &content)?;
            result
                .paths
                .into_iter()
                .next()
                .ok_or_else(|| StudioError::Store(format!("No path reported for {}", name)))
        })
        .await
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        self.with_api("list_documents", |api| Ok(api.list_documents()?.documents))
            .await
    }

    pub async fn load_document(&self, name: String) -> Result<Document> {
        self.with_api("load_document", move |api| {
            api.load_document(&name)?
                .document
                .ok_or(StudioError::DocumentNotFound(name))
        })
        .await
    }

    pub async fn generate_diagram(&self, description: String) -> Result<GeneratedDiagram> {
        let features = self
            .with_api("generate_diagram", |api| Ok(api.config().features.clone()))
            .await?;
        let generator = Arc::clone(&self.generator);

        run_blocking(move || generate_with_fallback(generator.as_ref(), &features, &description))
            .await
            .inspect(|d| info!(fallback = d.is_fallback(), "diagram ready"))
            .inspect_err(|e| error!(error = %e, "diagram generation failed"))
    }

    /// Never fails; see [`TemplateFetch`] for how problems are reported.
    pub async fn fetch_templates(&self, query: TemplateQuery) -> TemplateFetch {
        let templates = Arc::clone(&self.templates);
        let fallback_query = query.clone();
        match run_blocking(move || Ok(fetch_with_fallback(templates.as_ref(), &query))).await {
            Ok(fetch) => fetch,
            Err(e) => {
                error!(error = %e, "template fetch task failed");
                TemplateFetch {
                    templates: fallback_query
                        .apply(&crate::templates::builtin::builtin_templates()),
                    error: Some(e.to_string()),
                    fallback: true,
                }
            }
        }
    }

    pub async fn upload_template(&self, upload: TemplateUpload) -> Result<ApiResponse> {
        // Validation errors come back before any request is made
        upload.validate()?;
        let templates = Arc::clone(&self.templates);
        run_blocking(move || templates.upload(&upload))
            .await
            .inspect_err(|e| error!(error = %e, "template upload failed"))
    }
}
