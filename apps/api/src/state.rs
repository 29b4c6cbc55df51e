use std::sync::Arc;

use crate::config::Config;
use crate::editor::SessionRegistry;
use crate::import::TextImporter;
use crate::render::{PdfExporter, PreviewRenderer};
use crate::store::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResumeStore>,
    pub sessions: SessionRegistry,
    pub renderer: Arc<dyn PreviewRenderer>,
    /// `None` when no Anthropic key is configured; import requests get 501.
    pub importer: Option<Arc<dyn TextImporter>>,
    /// No exporter ships with the service; export requests get 501 until one is wired in.
    pub exporter: Option<Arc<dyn PdfExporter>>,
    pub config: Config,
}
