//! HTTP API for document analysis.
//!
//! Accepts a PDF upload plus a description of it, and returns the model's
//! verdict. Also exposes a liveness endpoint that probes the LLM.

mod handlers;
mod routes;

pub use routes::create_router;

use std::sync::Arc;

use crate::analysis::Analyzer;
use crate::config::Settings;
use crate::extract::TextExtractor;
use crate::llm::{LlmClient, LlmError, LlmTransport};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub extractor: Arc<TextExtractor>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Build state that talks to the configured LLM endpoint.
    pub fn new(settings: Settings) -> Result<Self, LlmError> {
        let client = LlmClient::new(settings.llm.clone())?;
        Ok(Self::with_transport(settings, Arc::new(client)))
    }

    /// Build state around an existing transport.
    pub fn with_transport(settings: Settings, transport: Arc<dyn LlmTransport>) -> Self {
        Self {
            analyzer: Arc::new(Analyzer::new(transport)),
            extractor: Arc::new(TextExtractor::new()),
            settings: Arc::new(settings),
        }
    }

    pub fn transport(&self) -> &Arc<dyn LlmTransport> {
        self.analyzer.transport()
    }
}

/// Start the web server.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let addr = settings.server.bind_addr;
    let state = AppState::new(settings)?;
    let app = create_router(state);

    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
