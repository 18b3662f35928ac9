//! Upload form and job submission.

use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use uuid::Uuid;

use seedscan_common::error::AppError;
use seedscan_engine::BatchOrchestrator;

use crate::state::AppState;
use crate::views;

/// Multipart field carrying the phrase file.
pub const UPLOAD_FIELD: &str = "file";

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(upload_form).post(upload_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

fn upload_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("Upload exceeds the size limit: {}", e))
    } else {
        AppError::Validation(format!("Malformed upload: {}", e))
    }
}

/// GET / - Render the upload form.
async fn upload_form() -> Html<String> {
    views::upload_form()
}

/// POST / - Store the uploaded phrase file and start a batch job.
///
/// Responds `202 Accepted` as soon as the job is queued; the `Location`
/// header points at the job status page.
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(upload_error)?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let contents = field
            .bytes()
            .await
            .map_err(upload_error)?;
        upload = Some((file_name, contents));
        break;
    }

    let (file_name, contents) = upload.ok_or_else(|| {
        AppError::Validation(format!("Missing '{}' field in upload", UPLOAD_FIELD))
    })?;

    let input_file = state
        .storage
        .save_upload(file_name.as_deref(), &contents)
        .await?;

    let job_id = Uuid::new_v4();
    let output_file = format!("results-{}.txt", job_id);
    let batch = state.config.batch_config(
        state.storage.path_of(&input_file),
        state.storage.path_of(&output_file),
    );
    let orchestrator = BatchOrchestrator::for_sui(
        batch,
        &state.config.balance_api_url,
        Some(state.config.request_timeout()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    let job = state
        .jobs
        .submit(job_id, input_file, output_file, orchestrator)
        .await;

    tracing::info!(
        job_id = %job.id,
        input = %job.input_file,
        bytes = contents.len(),
        "Upload accepted"
    );

    Ok((
        StatusCode::ACCEPTED,
        [(header::LOCATION, format!("/jobs/{}", job.id))],
        views::job_submitted(&job),
    ))
}
