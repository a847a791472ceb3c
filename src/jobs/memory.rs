use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Datelike;

use crate::error::{AppError, AppResult};
use crate::id::new_uuid_v7;
use crate::jobs::{JobDirectory, JobPatch, JobStatus, NewJob, RemoteJob, JOBS_NOT_FOUND};
use crate::time::now_ms;

/// In-memory job directory for tests and offline development. Behaviour
/// mirrors the SQLite directory: ids and inspection numbers are assigned on
/// insert and listings come back newest first.
#[derive(Default)]
pub struct MemoryJobDirectory {
    inner: Mutex<Vec<RemoteJob>>,
}

impl MemoryJobDirectory {
    pub fn new() -> Self {
        MemoryJobDirectory::default()
    }

    fn sorted_newest_first(mut jobs: Vec<RemoteJob>) -> Vec<RemoteJob> {
        // UUIDv7 ids order by creation time, which breaks created_at ties.
        jobs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        jobs
    }
}

#[async_trait]
impl JobDirectory for MemoryJobDirectory {
    async fn list_jobs(&self, statuses: &[JobStatus]) -> AppResult<Vec<RemoteJob>> {
        let jobs = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let filtered = jobs
            .iter()
            .filter(|job| statuses.is_empty() || statuses.contains(&job.status))
            .cloned()
            .collect();
        Ok(Self::sorted_newest_first(filtered))
    }

    async fn get_job(&self, id: &str) -> AppResult<Option<RemoteJob>> {
        let jobs = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(jobs.iter().find(|job| job.id == id).cloned())
    }

    async fn insert_job(&self, job: NewJob) -> AppResult<RemoteJob> {
        let mut jobs = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let now = now_ms();
        let year = chrono::Utc::now().year();
        let taken = jobs
            .iter()
            .filter(|existing| {
                existing
                    .inspection_number
                    .as_deref()
                    .is_some_and(|n| n.starts_with(&format!("{year}-")))
            })
            .count();
        let record = RemoteJob {
            id: new_uuid_v7(),
            client_name: job.client_name,
            status: job.status,
            report_data: job.report_data,
            parent_id: job.parent_id,
            inspection_number: Some(format!("{year}-{:04}", taken + 1)),
            created_at: now,
            updated_at: now,
        };
        jobs.push(record.clone());
        Ok(record)
    }

    async fn update_job(&self, id: &str, patch: JobPatch) -> AppResult<RemoteJob> {
        let mut jobs = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let job = jobs
            .iter_mut()
            .find(|job| job.id == id)
            .ok_or_else(|| {
                AppError::new(JOBS_NOT_FOUND, "Job not found").with_context("id", id.to_string())
            })?;
        if let Some(client_name) = patch.client_name {
            job.client_name = client_name;
        }
        if let Some(status) = patch.status {
            job.status = status;
        }
        if let Some(report_data) = patch.report_data {
            job.report_data = report_data;
        }
        job.updated_at = now_ms();
        Ok(job.clone())
    }

    async fn list_children(&self, parent_id: &str) -> AppResult<Vec<RemoteJob>> {
        let jobs = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let filtered = jobs
            .iter()
            .filter(|job| {
                job.parent_id.as_deref() == Some(parent_id)
                    && job.status == JobStatus::ContributionReady
            })
            .cloned()
            .collect();
        Ok(Self::sorted_newest_first(filtered))
    }
}
