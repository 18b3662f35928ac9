use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One candidate mnemonic phrase taken from an input line.
///
/// The `Debug` output is redacted so phrases never end up in logs verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct SeedPhrase(String);

impl SeedPhrase {
    /// Trim a raw input line; blank lines yield `None`.
    pub fn from_line(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn word_count(&self) -> usize {
        self.0.split_whitespace().count()
    }

    /// Log-safe form: the first word and the word count.
    pub fn redacted(&self) -> String {
        let first = self.0.split_whitespace().next().unwrap_or_default();
        format!("{first} …({} words)", self.word_count())
    }
}

impl std::fmt::Debug for SeedPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SeedPhrase").field(&self.redacted()).finish()
    }
}

/// A chain address derived from exactly one `SeedPhrase`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivedAddress(String);

impl DerivedAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DerivedAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Balance payload returned by the balance API, stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceRecord(serde_json::Value);

impl BalanceRecord {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Compact single-line JSON, as written to the output file.
    pub fn to_line(&self) -> String {
        self.0.to_string()
    }
}

/// Per-run configuration handed to the batch orchestrator at construction.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Balance API key
    pub api_key: String,
    /// Newline-delimited phrase file
    pub input_path: PathBuf,
    /// Destination file, truncated at the start of each run
    pub output_path: PathBuf,
    /// Maximum attempts per address on connection failures
    pub retry_limit: u32,
    /// Sleep between connection retries
    pub retry_delay: Duration,
}

/// Live counters published while a batch is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    /// Non-blank lines in the input
    pub total: usize,
    /// Phrases fully handled so far
    pub processed: usize,
    /// Phrases that produced an address
    pub checked: usize,
    /// Balance records written
    pub saved: usize,
}

/// Final counters of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub checked: usize,
    pub saved: usize,
    pub derivation_failures: usize,
    pub balance_failures: usize,
    pub cancelled: bool,
}

/// Lifecycle of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Cancelled | JobStatus::Failed
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Point-in-time view of a job, as served by the status endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub status: JobStatus,
    /// Stored name of the uploaded input file
    pub input_file: String,
    /// Name of the result file under the media root
    pub output_file: String,
    pub progress: BatchProgress,
    pub summary: Option<BatchSummary>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}
