//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single
//! entry point for FlowStudio operations, whichever UI drives them.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Dispatches** to the appropriate command function
//! - **Applies the configuration**: render server, feature toggles, default
//!   output directories
//! - **Returns structured types** (`Result<CmdResult>`)
//!
//! It does no business logic, no terminal I/O and no formatting.
//!
//! ## Generic Over DocumentStore
//!
//! `StudioApi<S: DocumentStore>` is generic over the storage backend:
//! - Production: `StudioApi<FileStore>`
//! - Testing: `StudioApi<InMemoryStore>`
//!
//! Generators and template sources are passed per call, so the host can share
//! them across threads while the API itself sits behind a lock.

use crate::ai::DiagramGenerator;
use crate::ai::provider::ProviderClient;
use crate::commands::{self, CmdMessage, CmdResult, StudioPaths};
use crate::config::StudioConfig;
use crate::encoder::DiagramFormat;
use crate::error::Result;
use crate::model::MetricData;
use crate::store::DocumentStore;
use crate::templates::{self, TemplateQuery, TemplateSource, TemplateUpload};
use std::path::Path;

pub struct StudioApi<S: DocumentStore> {
    store: S,
    paths: StudioPaths,
    config: StudioConfig,
}

impl<S: DocumentStore> StudioApi<S> {
    pub fn new(store: S, paths: StudioPaths, config: StudioConfig) -> Self {
        Self {
            store,
            paths,
            config,
        }
    }

    pub fn paths(&self) -> &StudioPaths {
        &self.paths
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Generator for the configured provider.
    pub fn provider_client(&self) -> ProviderClient {
        ProviderClient::from_config(&self.config)
    }

    /// Template source for the configured locator.
    pub fn template_source(&self) -> Box<dyn TemplateSource + Send + Sync> {
        templates::source_for_config(&self.config)
    }

    fn preview_server(&self) -> Option<&str> {
        self.config
            .features
            .diagram_preview
            .then_some(self.config.plantuml_server.as_str())
    }

    fn review_tracking_disabled() -> CmdResult {
        let mut result = CmdResult::default();
        result.add_message(CmdMessage::warning(
            "Review tracking is disabled (features.review-tracking)",
        ));
        result
    }

    // --- Documents ---

    pub fn save_document(&mut self, name: &str, content: &str) -> Result<CmdResult> {
        commands::documents::save(&mut self.store, name, content)
    }

    pub fn load_document(&self, name: &str) -> Result<CmdResult> {
        commands::documents::load(&self.store, name)
    }

    pub fn list_documents(&self) -> Result<CmdResult> {
        commands::documents::list(&self.store)
    }

    pub fn delete_document(&mut self, name: &str) -> Result<CmdResult> {
        commands::documents::delete(&mut self.store, name)
    }

    pub fn export_document(&self, name: &str, dir: &Path) -> Result<CmdResult> {
        commands::documents::export(&self.store, name, dir)
    }

    pub fn archive_documents(&self, dir: &Path) -> Result<CmdResult> {
        commands::documents::archive(&self.store, dir)
    }

    // --- Diagrams ---

    pub fn encode_diagram(&self, text: &str, format: DiagramFormat) -> Result<CmdResult> {
        commands::diagram::encode(text, self.preview_server(), format)
    }

    pub fn decode_diagram(&self, token_or_url: &str) -> Result<CmdResult> {
        commands::diagram::decode(token_or_url)
    }

    pub fn document_diagrams(&self, name: &str, format: DiagramFormat) -> Result<CmdResult> {
        commands::diagram::document(&self.store, name, self.preview_server(), format)
    }

    pub fn generate_diagram<G>(&self, generator: &G, description: &str) -> Result<CmdResult>
    where
        G: DiagramGenerator + ?Sized,
    {
        commands::diagram::generate(generator, &self.config, description)
    }

    // --- Templates ---

    pub fn fetch_templates<T>(&self, source: &T, query: &TemplateQuery) -> Result<CmdResult>
    where
        T: TemplateSource + ?Sized,
    {
        commands::templates::fetch(source, query)
    }

    pub fn show_template<T>(&self, source: &T, id: &str) -> Result<CmdResult>
    where
        T: TemplateSource + ?Sized,
    {
        commands::templates::show(source, id)
    }

    pub fn upload_template<T>(&self, source: &T, template: &TemplateUpload) -> Result<CmdResult>
    where
        T: TemplateSource + ?Sized,
    {
        commands::templates::upload(source, template)
    }

    pub fn delete_template<T>(&self, source: &T, id: &str) -> Result<CmdResult>
    where
        T: TemplateSource + ?Sized,
    {
        commands::templates::delete(source, id)
    }

    pub fn apply_template<T>(
        &mut self,
        source: &T,
        id: &str,
        name: Option<&str>,
        overwrite: bool,
    ) -> Result<CmdResult>
    where
        T: TemplateSource + ?Sized,
    {
        commands::templates::apply(&mut self.store, source, id, name, overwrite)
    }

    // --- Reviews ---

    pub fn add_comment(&mut self, comment: commands::reviews::NewComment) -> Result<CmdResult> {
        if !self.config.features.review_tracking {
            return Ok(Self::review_tracking_disabled());
        }
        commands::reviews::add(&mut self.store, comment)
    }

    pub fn list_comments(&self) -> Result<CmdResult> {
        commands::reviews::list(&self.store)
    }

    pub fn clear_comments(&mut self) -> Result<CmdResult> {
        commands::reviews::clear(&mut self.store)
    }

    pub fn import_comments(&mut self, payload: &str) -> Result<CmdResult> {
        if !self.config.features.review_tracking {
            return Ok(Self::review_tracking_disabled());
        }
        commands::reviews::import(&mut self.store, payload)
    }

    pub fn process_rag_pairs(&mut self) -> Result<CmdResult> {
        commands::rag::process(&mut self.store)
    }

    pub fn list_rag_pairs(&self) -> Result<CmdResult> {
        commands::rag::list(&self.store)
    }

    /// Export to `dir`, or next to the documents when not given.
    pub fn export_rag_pairs(&self, dir: Option<&Path>) -> Result<CmdResult> {
        let dir = dir.unwrap_or(&self.paths.documents);
        commands::rag::export(&self.store, dir)
    }

    // --- Metrics ---

    pub fn add_metric(&mut self, metric: MetricData) -> Result<CmdResult> {
        commands::metrics::add(&mut self.store, metric)
    }

    pub fn list_metrics(&self) -> Result<CmdResult> {
        commands::metrics::list(&self.store)
    }

    pub fn metrics_summary(&self) -> Result<CmdResult> {
        commands::metrics::summary(&self.store)
    }

    pub fn clear_metrics(&mut self) -> Result<CmdResult> {
        commands::metrics::clear(&mut self.store)
    }

    // --- Config ---

    pub fn config_command(&mut self, action: commands::config::ConfigAction) -> Result<CmdResult> {
        let result = commands::config::run(&self.paths, action)?;
        if let Some(updated) = &result.config {
            self.config = updated.clone();
        }
        Ok(result)
    }
}
