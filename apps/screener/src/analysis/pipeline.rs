//! Batch pipeline behind POST /home: extract, analyze, score and persist, one file at a time.

use std::sync::Arc;

use bytes::Bytes;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::analysis::extractor::{extract_text, TextExtractor};
use crate::analysis::prompts::AnalysisTask;
use crate::analysis::scoring::match_percentage;
use crate::analysis::store::{save_analysis, AnalysisRecord};
use crate::errors::AppError;
use crate::llm_client::{analyze, AnalysisClient, AnalysisRequest};

pub const INVALID_TASK_MESSAGE: &str = "Invalid task selected.";
pub const NO_FILES_MESSAGE: &str = "Please upload at least one resume PDF.";
pub const FILE_FAILED_MESSAGE: &str = "Error processing one of the uploaded PDFs.";
pub const BATCH_STORED_MESSAGE: &str = "Extracted Texts from multiple resumes stored successfully.";

/// A file part from the upload form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Per-file result shown on the home page.
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub file_name: String,
    pub extracted_text: String,
    pub generated_text: String,
    pub match_percentage: f64,
}

/// Everything rendered after a submission. `error` never names the failing file.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub results: Vec<FileAnalysis>,
    pub error: Option<String>,
    pub message: Option<String>,
}

/// Collaborators the pipeline needs, borrowed from `AppState`.
pub struct Pipeline<'a> {
    pub db: &'a SqlitePool,
    pub analyzer: &'a dyn AnalysisClient,
    pub extractor: Arc<dyn TextExtractor>,
}

impl Pipeline<'_> {
    /// Validates the submission, then processes each file in upload order.
    ///
    /// Validation failures return an outcome with only `error` set and touch nothing.
    /// Extraction failures mark the batch and move on to the next file. Database
    /// failures abort the request.
    pub async fn run(
        &self,
        job_description: &str,
        task: Option<&str>,
        files: Vec<UploadedFile>,
    ) -> Result<BatchOutcome, AppError> {
        let Some(task) = task.and_then(AnalysisTask::from_form_value) else {
            return Ok(BatchOutcome::failed(INVALID_TASK_MESSAGE));
        };
        if files.is_empty() {
            return Ok(BatchOutcome::failed(NO_FILES_MESSAGE));
        }

        info!(
            "Processing batch of {} file(s) with task '{}'",
            files.len(),
            task.as_str()
        );

        let mut outcome = BatchOutcome::default();
        for file in files {
            match self.process_file(job_description, task, file).await? {
                Some(result) => outcome.results.push(result),
                None => outcome.error = Some(FILE_FAILED_MESSAGE.to_string()),
            }
        }

        if outcome.error.is_none() {
            outcome.message = Some(BATCH_STORED_MESSAGE.to_string());
        }
        Ok(outcome)
    }

    /// `Ok(None)` when the file could not be read as a PDF.
    async fn process_file(
        &self,
        job_description: &str,
        task: AnalysisTask,
        file: UploadedFile,
    ) -> Result<Option<FileAnalysis>, AppError> {
        let extracted_text = match extract_text(self.extractor.clone(), file.bytes).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to extract text from '{}': {e}", file.file_name);
                return Ok(None);
            }
        };

        let generated_text = analyze(
            self.analyzer,
            &AnalysisRequest {
                prompt: task.prompt(),
                job_description,
                resume_text: &extracted_text,
            },
        )
        .await;

        let match_percentage = if task.computes_match() {
            match_percentage(job_description, &extracted_text)
        } else {
            0.0
        };

        save_analysis(
            self.db,
            &AnalysisRecord {
                file_name: &file.file_name,
                extracted_text: &extracted_text,
                response_text: &generated_text,
                match_percentage,
            },
        )
        .await?;

        Ok(Some(FileAnalysis {
            file_name: file.file_name,
            extracted_text,
            generated_text,
            match_percentage,
        }))
    }
}

impl BatchOutcome {
    fn failed(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{DownAnalyzer, EchoAnalyzer, PlainTextExtractor};
    use super::*;
    use crate::analysis::store::{list_documents, list_responses};
    use crate::db::test_pool;

    fn upload(name: &str, body: &'static str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            bytes: Bytes::from_static(body.as_bytes()),
        }
    }

    async fn row_counts(pool: &SqlitePool) -> (usize, usize) {
        (
            list_documents(pool).await.unwrap().len(),
            list_responses(pool).await.unwrap().len(),
        )
    }

    #[tokio::test]
    async fn test_unknown_task_has_no_side_effects() {
        let pool = test_pool().await;
        let pipeline = Pipeline {
            db: &pool,
            analyzer: &EchoAnalyzer,
            extractor: Arc::new(PlainTextExtractor),
        };

        let outcome = pipeline
            .run("python", Some("summarize"), vec![upload("a.pdf", "python")])
            .await
            .unwrap();

        assert_eq!(outcome.error.as_deref(), Some(INVALID_TASK_MESSAGE));
        assert!(outcome.results.is_empty());
        assert!(outcome.message.is_none());
        assert_eq!(row_counts(&pool).await, (0, 0));
    }

    #[tokio::test]
    async fn test_missing_task_is_invalid() {
        let pool = test_pool().await;
        let pipeline = Pipeline {
            db: &pool,
            analyzer: &EchoAnalyzer,
            extractor: Arc::new(PlainTextExtractor),
        };

        let outcome = pipeline
            .run("python", None, vec![upload("a.pdf", "python")])
            .await
            .unwrap();
        assert_eq!(outcome.error.as_deref(), Some(INVALID_TASK_MESSAGE));
    }

    #[tokio::test]
    async fn test_no_files_has_no_side_effects() {
        let pool = test_pool().await;
        let pipeline = Pipeline {
            db: &pool,
            analyzer: &EchoAnalyzer,
            extractor: Arc::new(PlainTextExtractor),
        };

        let outcome = pipeline
            .run("python", Some("analyze_resume"), vec![])
            .await
            .unwrap();

        assert_eq!(outcome.error.as_deref(), Some(NO_FILES_MESSAGE));
        assert_eq!(row_counts(&pool).await, (0, 0));
    }

    #[tokio::test]
    async fn test_corrupted_file_does_not_stop_the_batch() {
        let pool = test_pool().await;
        let pipeline = Pipeline {
            db: &pool,
            analyzer: &EchoAnalyzer,
            extractor: Arc::new(PlainTextExtractor),
        };

        let outcome = pipeline
            .run(
                "rust go",
                Some("percentage_match"),
                vec![
                    upload("one.pdf", "rust developer"),
                    upload("two.pdf", "CORRUPT bytes"),
                    upload("three.pdf", "go and rust"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(outcome.error.as_deref(), Some(FILE_FAILED_MESSAGE));
        assert!(outcome.message.is_none());
        let names: Vec<_> = outcome.results.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["one.pdf", "three.pdf"]);
        assert_eq!(outcome.results[0].match_percentage, 50.0);
        assert_eq!(outcome.results[1].match_percentage, 100.0);
        assert_eq!(row_counts(&pool).await, (2, 2));
    }

    #[tokio::test]
    async fn test_analyze_task_reports_zero_match() {
        let pool = test_pool().await;
        let pipeline = Pipeline {
            db: &pool,
            analyzer: &EchoAnalyzer,
            extractor: Arc::new(PlainTextExtractor),
        };

        let outcome = pipeline
            .run("python", Some("analyze_resume"), vec![upload("a.pdf", "python")])
            .await
            .unwrap();

        assert_eq!(outcome.message.as_deref(), Some(BATCH_STORED_MESSAGE));
        assert_eq!(outcome.results[0].match_percentage, 0.0);
        assert_eq!(
            outcome.results[0].generated_text,
            "**Overview**: reviewed 'python'"
        );
        let responses = list_responses(&pool).await.unwrap();
        assert_eq!(responses[0].match_percentage, Some(0.0));
    }

    #[tokio::test]
    async fn test_ai_failure_is_stored_as_response_text() {
        let pool = test_pool().await;
        let pipeline = Pipeline {
            db: &pool,
            analyzer: &DownAnalyzer,
            extractor: Arc::new(PlainTextExtractor),
        };

        let outcome = pipeline
            .run("python", Some("percentage_match"), vec![upload("a.pdf", "python")])
            .await
            .unwrap();

        assert!(outcome.error.is_none());
        let generated = &outcome.results[0].generated_text;
        assert!(generated.starts_with("Error in generating response:"));
        assert_eq!(outcome.results[0].match_percentage, 100.0);
        let responses = list_responses(&pool).await.unwrap();
        assert_eq!(&responses[0].response_text, generated);
    }

    #[tokio::test]
    async fn test_real_pdf_flows_through_pipeline() {
        use crate::analysis::extractor::{sample_pdf, PdfTextExtractor};

        let pool = test_pool().await;
        let pipeline = Pipeline {
            db: &pool,
            analyzer: &EchoAnalyzer,
            extractor: Arc::new(PdfTextExtractor),
        };
        let pdf = UploadedFile {
            file_name: "scan.pdf".to_string(),
            bytes: Bytes::from(sample_pdf(&["experienced with kubernetes"])),
        };

        let outcome = pipeline
            .run("kubernetes", Some("percentage_match"), vec![pdf])
            .await
            .unwrap();

        assert!(outcome.error.is_none(), "{:?}", outcome.error);
        assert!(outcome.results[0].extracted_text.contains("kubernetes"));
        let documents = list_documents(&pool).await.unwrap();
        assert_eq!(documents[0].file_name, "scan.pdf");
    }
}
