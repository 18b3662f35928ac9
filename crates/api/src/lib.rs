//! HTTP surface: phrase-file upload, background batch jobs, result download.
//!
//! Endpoints:
//! - GET  /                       upload form
//! - POST /                       upload a phrase file, start a job
//! - GET  /jobs/{id}              job status page
//! - GET  /api/jobs               list jobs
//! - GET  /api/jobs/{id}          job status as JSON
//! - POST /api/jobs/{id}/cancel   cancel a running job
//! - GET  /download/{filename}    fetch a result file
//! - GET  /health

pub mod jobs;
pub mod routes;
pub mod state;
pub mod storage;
pub mod views;
