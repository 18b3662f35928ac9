//! In-memory registry of batch jobs.
//!
//! Each submitted job runs on its own tokio task. Progress is read from the
//! orchestrator's watch channel whenever a snapshot is taken. Nothing survives
//! a restart.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use seedscan_balance::BalanceFetcher;
use seedscan_common::types::{BatchProgress, BatchSummary, JobSnapshot, JobStatus};
use seedscan_derive::AddressDeriver;
use seedscan_engine::BatchOrchestrator;

struct JobEntry {
    id: Uuid,
    input_file: String,
    output_file: String,
    status: JobStatus,
    progress: watch::Receiver<BatchProgress>,
    summary: Option<BatchSummary>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    cancel: CancellationToken,
}

impl JobEntry {
    fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            status: self.status,
            input_file: self.input_file.clone(),
            output_file: self.output_file.clone(),
            progress: *self.progress.borrow(),
            summary: self.summary,
            error: self.error.clone(),
            created_at: self.created_at,
            finished_at: self.finished_at,
        }
    }
}

/// Jobs are kept for the life of the process, finished or not; there is no
/// eviction, matching the media root which is never cleaned up either.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, JobEntry>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job and start it on a background task.
    pub async fn submit<D, F>(
        &self,
        id: Uuid,
        input_file: String,
        output_file: String,
        orchestrator: BatchOrchestrator<D, F>,
    ) -> JobSnapshot
    where
        D: AddressDeriver + 'static,
        F: BalanceFetcher + 'static,
    {
        let (progress_tx, progress_rx) = watch::channel(BatchProgress::default());
        let cancel = CancellationToken::new();

        let entry = JobEntry {
            id,
            input_file,
            output_file,
            status: JobStatus::Queued,
            progress: progress_rx,
            summary: None,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
            cancel: cancel.clone(),
        };
        let snapshot = entry.snapshot();
        self.jobs.write().await.insert(id, entry);

        let registry = self.clone();
        tokio::spawn(async move {
            registry.mark_running(id).await;
            let result = orchestrator.run(cancel, &progress_tx).await;
            registry.finish(id, result).await;
        });

        tracing::info!(job_id = %id, "Job submitted");
        snapshot
    }

    pub async fn get(&self, id: Uuid) -> Option<JobSnapshot> {
        self.jobs.read().await.get(&id).map(JobEntry::snapshot)
    }

    /// All jobs, oldest first.
    pub async fn list(&self) -> Vec<JobSnapshot> {
        let mut jobs: Vec<_> = self
            .jobs
            .read()
            .await
            .values()
            .map(JobEntry::snapshot)
            .collect();
        jobs.sort_by_key(|job| job.created_at);
        jobs
    }

    /// Request cancellation. Finished jobs are left untouched.
    pub async fn cancel(&self, id: Uuid) -> Option<JobSnapshot> {
        let jobs = self.jobs.read().await;
        let entry = jobs.get(&id)?;
        if !entry.status.is_finished() {
            entry.cancel.cancel();
            tracing::info!(job_id = %id, "Job cancellation requested");
        }
        Some(entry.snapshot())
    }

    /// Cancel every job that is still queued or running.
    pub async fn cancel_all(&self) -> usize {
        let jobs = self.jobs.read().await;
        let mut cancelled = 0;
        for entry in jobs.values().filter(|e| !e.status.is_finished()) {
            entry.cancel.cancel();
            cancelled += 1;
        }
        cancelled
    }

    async fn mark_running(&self, id: Uuid) {
        if let Some(entry) = self.jobs.write().await.get_mut(&id) {
            entry.status = JobStatus::Running;
        }
    }

    async fn finish(&self, id: Uuid, result: anyhow::Result<BatchSummary>) {
        let mut jobs = self.jobs.write().await;
        let Some(entry) = jobs.get_mut(&id) else {
            return;
        };
        entry.finished_at = Some(Utc::now());

        match result {
            Ok(summary) => {
                entry.status = if summary.cancelled {
                    JobStatus::Cancelled
                } else {
                    JobStatus::Completed
                };
                entry.summary = Some(summary);
                tracing::info!(
                    job_id = %id,
                    status = %entry.status,
                    checked = summary.checked,
                    saved = summary.saved,
                    "Job finished"
                );
            }
            Err(e) => {
                entry.status = JobStatus::Failed;
                entry.error = Some(format!("{e:#}"));
                tracing::error!(job_id = %id, error = %format!("{e:#}"), "Job failed");
            }
        }
    }
}
