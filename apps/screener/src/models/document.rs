use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Text extracted from one uploaded PDF. Correlated with its response by file name only.
#[derive(Debug, Clone, FromRow)]
pub struct PdfDocumentRow {
    pub id: i64,
    pub file_name: String,
    pub extracted_text: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AnalysisResponseRow {
    pub id: i64,
    pub file_name: String,
    pub response_text: String,
    pub match_percentage: Option<f64>,
    pub created_at: DateTime<Utc>,
}
