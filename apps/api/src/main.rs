mod config;
mod db;
mod editor;
mod errors;
mod import;
mod llm_client;
mod models;
mod render;
mod routes;
mod schema;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::editor::SessionRegistry;
use crate::import::{LlmTextImporter, TextImporter};
use crate::llm_client::LlmClient;
use crate::render::TextPreviewRenderer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgResumeStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume editor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgResumeStore::new(db));

    // AI import is optional
    let importer: Option<Arc<dyn TextImporter>> = match &config.anthropic_api_key {
        Some(key) => {
            let settings = config.llm_settings();
            info!(
                "LLM client initialized (model: {}, max_tokens: {}, timeout: {}s)",
                settings.model,
                settings.max_tokens,
                settings.timeout.as_secs()
            );
            let llm = LlmClient::new(key.clone(), settings)?;
            Some(Arc::new(LlmTextImporter::new(llm)))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set; AI text import is disabled");
            None
        }
    };

    let preview = config.preview_config();
    info!(
        "Preview: {}ms debounce, {} columns",
        preview.debounce.as_millis(),
        preview.layout_width
    );

    // Abandoned sessions are swept so their drafts and preview tasks don't pile up
    let sessions = SessionRegistry::new();
    sessions.spawn_sweeper(config.session_idle_ttl, config.session_sweep_interval);
    info!(
        "Sessions idle for {}s are closed (checked every {}s)",
        config.session_idle_ttl.as_secs(),
        config.session_sweep_interval.as_secs()
    );

    // Build app state
    let state = AppState {
        store,
        sessions,
        renderer: Arc::new(TextPreviewRenderer),
        importer,
        exporter: None,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins once the web client's domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
