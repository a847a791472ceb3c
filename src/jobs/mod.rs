use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{AppError, AppResult};
use crate::export::ReportPayload;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryJobDirectory;
pub use sqlite::SqliteJobDirectory;

pub const JOBS_NOT_FOUND: &str = "JOBS/NOT_FOUND";
pub const JOBS_UNKNOWN_STATUS: &str = "JOBS/UNKNOWN_STATUS";
pub const JOBS_INVALID_TRANSITION: &str = "JOBS/INVALID_TRANSITION";

/// Lifecycle of a remote job. The main line runs
/// `new -> in_progress -> review_ready -> completed` with an explicit
/// reopen; contribution records are inserted as `contribution_ready` and
/// end at `merged`. Status only moves on explicit user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum JobStatus {
    New,
    InProgress,
    ReviewReady,
    Completed,
    ContributionReady,
    Merged,
}

impl JobStatus {
    pub const ALL: &'static [JobStatus] = &[
        JobStatus::New,
        JobStatus::InProgress,
        JobStatus::ReviewReady,
        JobStatus::Completed,
        JobStatus::ContributionReady,
        JobStatus::Merged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::New => "new",
            JobStatus::InProgress => "in_progress",
            JobStatus::ReviewReady => "review_ready",
            JobStatus::Completed => "completed",
            JobStatus::ContributionReady => "contribution_ready",
            JobStatus::Merged => "merged",
        }
    }

    /// Strict parse at the I/O boundary; unknown strings are an error, not
    /// a default branch.
    pub fn parse(raw: &str) -> AppResult<JobStatus> {
        JobStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| {
                AppError::new(JOBS_UNKNOWN_STATUS, "Unknown job status")
                    .with_context("status", raw.to_string())
            })
    }

    pub fn can_transition(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (New, InProgress)
                | (InProgress, ReviewReady)
                | (ReviewReady, Completed)
                | (Completed, InProgress)
                | (ContributionReady, InProgress)
                | (ContributionReady, Merged)
        )
    }
}

/// One record in the shared job directory. `report_data` is the interchange
/// payload; it is validated when the row is read, never trusted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RemoteJob {
    pub id: String,
    pub client_name: String,
    pub status: JobStatus,
    pub report_data: ReportPayload,
    pub parent_id: Option<String>,
    /// Assigned by the directory on insert, not by the client.
    pub inspection_number: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub client_name: String,
    pub status: JobStatus,
    pub report_data: ReportPayload,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub client_name: Option<String>,
    pub status: Option<JobStatus>,
    pub report_data: Option<ReportPayload>,
}

/// The remote job directory as the core consumes it. Any backend with
/// filtered queries and CRUD satisfies this; the directory assigns ids and
/// inspection numbers.
#[async_trait]
pub trait JobDirectory: Send + Sync {
    /// Jobs whose status is in `statuses`, newest first. An empty filter
    /// returns everything.
    async fn list_jobs(&self, statuses: &[JobStatus]) -> AppResult<Vec<RemoteJob>>;

    async fn get_job(&self, id: &str) -> AppResult<Option<RemoteJob>>;

    async fn insert_job(&self, job: NewJob) -> AppResult<RemoteJob>;

    async fn update_job(&self, id: &str, patch: JobPatch) -> AppResult<RemoteJob>;

    /// Contribution candidates of a parent: children still in
    /// `contribution_ready`, newest first.
    async fn list_children(&self, parent_id: &str) -> AppResult<Vec<RemoteJob>>;
}

/// Move a job along its lifecycle, refusing transitions the state machine
/// does not allow. The UI goes through these helpers and never writes raw
/// status values.
pub async fn transition_job(
    directory: &dyn JobDirectory,
    job_id: &str,
    next: JobStatus,
) -> AppResult<RemoteJob> {
    let job = directory
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::new(JOBS_NOT_FOUND, "Job not found").with_context("id", job_id))?;
    if !job.status.can_transition(next) {
        return Err(AppError::new(JOBS_INVALID_TRANSITION, "Status change not allowed")
            .with_context("from", job.status.as_str())
            .with_context("to", next.as_str()));
    }
    directory
        .update_job(
            job_id,
            JobPatch {
                status: Some(next),
                ..JobPatch::default()
            },
        )
        .await
}

pub async fn mark_review_ready(
    directory: &dyn JobDirectory,
    job_id: &str,
) -> AppResult<RemoteJob> {
    transition_job(directory, job_id, JobStatus::ReviewReady).await
}

pub async fn approve(directory: &dyn JobDirectory, job_id: &str) -> AppResult<RemoteJob> {
    transition_job(directory, job_id, JobStatus::Completed).await
}

pub async fn reopen(directory: &dyn JobDirectory, job_id: &str) -> AppResult<RemoteJob> {
    transition_job(directory, job_id, JobStatus::InProgress).await
}
