//! Axum route handlers for the session-gated pages.

use axum::{
    extract::{Multipart, State},
    response::Html,
    Extension,
};

use crate::analysis::pipeline::{BatchOutcome, Pipeline, UploadedFile};
use crate::analysis::store::{list_documents, list_responses};
use crate::auth::middleware::SessionUser;
use crate::errors::AppError;
use crate::state::AppState;
use crate::views;

/// Fields of the home form once the multipart body has been drained.
#[derive(Debug, Default)]
struct HomeSubmission {
    job_description: String,
    task: Option<String>,
    files: Vec<UploadedFile>,
}

/// GET /home
pub async fn handle_home(Extension(user): Extension<SessionUser>) -> Html<String> {
    Html(views::home_page(&user.0, &BatchOutcome::default()))
}

/// POST /home
///
/// Runs the analyze-and-store pipeline over every uploaded résumé and renders the batch.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let submission = read_submission(multipart).await?;

    let pipeline = Pipeline {
        db: &state.db,
        analyzer: state.analyzer.as_ref(),
        extractor: state.extractor.clone(),
    };
    let outcome = pipeline
        .run(
            &submission.job_description,
            submission.task.as_deref(),
            submission.files,
        )
        .await?;

    Ok(Html(views::home_page(&user.0, &outcome)))
}

/// GET /work
///
/// Lists every stored document and response.
pub async fn handle_work(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let documents = list_documents(&state.db).await?;
    let responses = list_responses(&state.db).await?;
    Ok(Html(views::work_page(&documents, &responses)))
}

async fn read_submission(mut multipart: Multipart) -> Result<HomeSubmission, AppError> {
    let malformed = |e: axum::extract::multipart::MultipartError| {
        AppError::Validation(format!("Malformed upload: {e}"))
    };

    let mut submission = HomeSubmission::default();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job_description" => {
                submission.job_description = field.text().await.map_err(malformed)?;
            }
            "task" => submission.task = Some(field.text().await.map_err(malformed)?),
            "resume_files" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(malformed)?;
                // Browsers send an empty part when no file was chosen.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                submission.files.push(UploadedFile { file_name, bytes });
            }
            _ => {}
        }
    }
    Ok(submission)
}
