//! Job status and cancellation routes.

use axum::extract::{Path, State};
use axum::response::{Html, Redirect};
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use seedscan_common::error::AppError;
use seedscan_common::types::JobSnapshot;

use crate::state::AppState;
use crate::views;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs/{id}", get(job_page))
        .route("/jobs/{id}/cancel", post(cancel_job_form))
        .route("/api/jobs", get(list_jobs))
        .route("/api/jobs/{id}", get(get_job))
        .route("/api/jobs/{id}/cancel", post(cancel_job))
}

/// Parse the `{id}` segment so malformed ids get the JSON error body.
fn job_id(raw: &str) -> Result<Uuid, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Invalid job id: {}", raw)))
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Job {} not found", id))
}

/// GET /jobs/:id - Status page, with a download link once results exist.
async fn job_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = job_id(&id)?;
    let job = state.jobs.get(id).await.ok_or_else(|| not_found(id))?;
    Ok(views::job_status(&job))
}

/// POST /jobs/:id/cancel - Cancel from the status page, then return to it.
async fn cancel_job_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let id = job_id(&id)?;
    state.jobs.cancel(id).await.ok_or_else(|| not_found(id))?;
    Ok(Redirect::to(&format!("/jobs/{}", id)))
}

/// GET /api/jobs - All known jobs, oldest first.
async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobSnapshot>> {
    Json(state.jobs.list().await)
}

/// GET /api/jobs/:id - Poll a single job.
async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobSnapshot>, AppError> {
    let id = job_id(&id)?;
    let job = state.jobs.get(id).await.ok_or_else(|| not_found(id))?;
    Ok(Json(job))
}

/// POST /api/jobs/:id/cancel - Request cancellation; finished jobs are unchanged.
async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobSnapshot>, AppError> {
    let id = job_id(&id)?;
    let job = state.jobs.cancel(id).await.ok_or_else(|| not_found(id))?;
    Ok(Json(job))
}
