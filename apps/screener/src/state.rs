use std::sync::Arc;

use sqlx::SqlitePool;

use crate::analysis::extractor::TextExtractor;
use crate::auth::session::SessionManager;
use crate::config::Config;
use crate::llm_client::AnalysisClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub sessions: SessionManager,
    /// Generation backend. Default: GeminiClient.
    pub analyzer: Arc<dyn AnalysisClient>,
    /// Document-to-text backend. Default: PdfTextExtractor.
    pub extractor: Arc<dyn TextExtractor>,
    /// bcrypt work factor for new password hashes.
    pub bcrypt_cost: u32,
}
