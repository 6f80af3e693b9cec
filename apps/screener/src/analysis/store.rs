use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::models::document::{AnalysisResponseRow, PdfDocumentRow};

/// One file's document row and its response row, written together.
pub struct AnalysisRecord<'a> {
    pub file_name: &'a str,
    pub extracted_text: &'a str,
    pub response_text: &'a str,
    pub match_percentage: f64,
}

/// Inserts the document and its response in a single transaction.
/// Either both rows exist afterwards or neither does.
pub async fn save_analysis(pool: &SqlitePool, record: &AnalysisRecord<'_>) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();

    let document_id = sqlx::query(
        "INSERT INTO pdf_data (file_name, extracted_text, uploaded_at) VALUES (?, ?, ?)",
    )
    .bind(record.file_name)
    .bind(record.extracted_text)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    let response_id = sqlx::query(
        r#"
        INSERT INTO pdf_responses (file_name, response_text, match_percentage, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(record.file_name)
    .bind(record.response_text)
    .bind(record.match_percentage)
    .bind(now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;

    info!(
        "Stored analysis for '{}' (pdf_data #{document_id}, pdf_responses #{response_id})",
        record.file_name
    );
    Ok(())
}

pub async fn list_documents(pool: &SqlitePool) -> Result<Vec<PdfDocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, PdfDocumentRow>("SELECT * FROM pdf_data ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn list_responses(pool: &SqlitePool) -> Result<Vec<AnalysisResponseRow>, sqlx::Error> {
    sqlx::query_as::<_, AnalysisResponseRow>("SELECT * FROM pdf_responses ORDER BY id")
        .fetch_all(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_save_analysis_writes_matching_pair() {
        let pool = test_pool().await;
        let record = AnalysisRecord {
            file_name: "alice.pdf",
            extracted_text: "I know python",
            response_text: "**Overview** good",
            match_percentage: 50.0,
        };

        save_analysis(&pool, &record).await.unwrap();

        let documents = list_documents(&pool).await.unwrap();
        let responses = list_responses(&pool).await.unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(responses.len(), 1);
        assert_eq!(documents[0].file_name, responses[0].file_name);
        assert_eq!(documents[0].extracted_text, "I know python");
        assert_eq!(responses[0].response_text, "**Overview** good");
        assert_eq!(responses[0].match_percentage, Some(50.0));
    }

    #[tokio::test]
    async fn test_failed_response_insert_rolls_back_document() {
        let pool = test_pool().await;
        // Force the second insert of the pair to fail.
        sqlx::query("DROP TABLE pdf_responses")
            .execute(&pool)
            .await
            .unwrap();

        let record = AnalysisRecord {
            file_name: "orphan.pdf",
            extracted_text: "text",
            response_text: "response",
            match_percentage: 0.0,
        };
        assert!(save_analysis(&pool, &record).await.is_err());

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pdf_data")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_duplicate_file_names_are_kept() {
        let pool = test_pool().await;
        let record = AnalysisRecord {
            file_name: "resume.pdf",
            extracted_text: "a",
            response_text: "b",
            match_percentage: 0.0,
        };
        save_analysis(&pool, &record).await.unwrap();
        save_analysis(&pool, &record).await.unwrap();

        let documents = list_documents(&pool).await.unwrap();
        assert_eq!(documents.len(), 2);
        assert!(documents[0].id < documents[1].id);
    }
}
