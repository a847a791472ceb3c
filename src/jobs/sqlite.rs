use std::path::Path;

use chrono::Datelike;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::id::new_uuid_v7;
use crate::jobs::{JobDirectory, JobPatch, JobStatus, NewJob, RemoteJob, JOBS_NOT_FOUND};
use crate::time::now_ms;

use async_trait::async_trait;

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS inspection_jobs (\n\
    id TEXT PRIMARY KEY,\n\
    client_name TEXT NOT NULL,\n\
    status TEXT NOT NULL,\n\
    report_data TEXT NOT NULL,\n\
    parent_id TEXT,\n\
    inspection_number TEXT,\n\
    created_at INTEGER NOT NULL,\n\
    updated_at INTEGER NOT NULL\n\
);\n\
CREATE INDEX IF NOT EXISTS idx_inspection_jobs_status ON inspection_jobs(status);\n\
CREATE INDEX IF NOT EXISTS idx_inspection_jobs_parent ON inspection_jobs(parent_id, status);\n";

pub async fn open_job_pool(db_path: &Path) -> anyhow::Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let opts = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(opts)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(&pool)
        .await
        .ok();
    info!(target: "veldkeur", event = "jobs_db_open", path = %db_path.display());
    Ok(pool)
}

pub async fn apply_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Job directory backed by one SQLite database, the deployment used when
/// the central store is reachable over a mounted or synced path.
pub struct SqliteJobDirectory {
    pool: SqlitePool,
}

impl SqliteJobDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteJobDirectory { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn job_from_row(row: &SqliteRow) -> AppResult<RemoteJob> {
    let status_raw: String = row.try_get("status").map_err(AppError::from)?;
    let status = JobStatus::parse(&status_raw)?;
    let report_raw: String = row.try_get("report_data").map_err(AppError::from)?;
    let report_data = serde_json::from_str(&report_raw).map_err(AppError::from)?;
    Ok(RemoteJob {
        id: row.try_get("id").map_err(AppError::from)?,
        client_name: row.try_get("client_name").map_err(AppError::from)?,
        status,
        report_data,
        parent_id: row.try_get("parent_id").map_err(AppError::from)?,
        inspection_number: row.try_get("inspection_number").map_err(AppError::from)?,
        created_at: row.try_get("created_at").map_err(AppError::from)?,
        updated_at: row.try_get("updated_at").map_err(AppError::from)?,
    })
}

/// Inspection numbers are `<year>-<sequence>`, assigned inside the insert
/// transaction so concurrent inserts cannot collide.
async fn next_inspection_number(
    conn: &mut sqlx::SqliteConnection,
    year: i32,
) -> Result<String, sqlx::Error> {
    let taken: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM inspection_jobs WHERE inspection_number LIKE ?")
            .bind(format!("{year}-%"))
            .fetch_one(conn)
            .await?;
    Ok(format!("{year}-{:04}", taken + 1))
}

#[async_trait]
impl JobDirectory for SqliteJobDirectory {
    async fn list_jobs(&self, statuses: &[JobStatus]) -> AppResult<Vec<RemoteJob>> {
        let rows = if statuses.is_empty() {
            sqlx::query("SELECT * FROM inspection_jobs ORDER BY created_at DESC, id DESC")
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::from)?
        } else {
            let placeholders = vec!["?"; statuses.len()].join(",");
            let sql = format!(
                "SELECT * FROM inspection_jobs WHERE status IN ({placeholders}) \
                 ORDER BY created_at DESC, id DESC"
            );
            let mut query = sqlx::query(&sql);
            for status in statuses {
                query = query.bind(status.as_str());
            }
            query.fetch_all(&self.pool).await.map_err(AppError::from)?
        };
        rows.iter().map(job_from_row).collect()
    }

    async fn get_job(&self, id: &str) -> AppResult<Option<RemoteJob>> {
        let row = sqlx::query("SELECT * FROM inspection_jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        row.as_ref().map(job_from_row).transpose()
    }

    async fn insert_job(&self, job: NewJob) -> AppResult<RemoteJob> {
        let id = new_uuid_v7();
        let now = now_ms();
        let year = chrono::Utc::now().year();
        let report_raw = serde_json::to_string(&job.report_data).map_err(AppError::from)?;

        let mut tx = self.pool.begin().await.map_err(AppError::from)?;
        let number = next_inspection_number(&mut *tx, year)
            .await
            .map_err(AppError::from)?;
        sqlx::query(
            "INSERT INTO inspection_jobs \
             (id, client_name, status, report_data, parent_id, inspection_number, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&job.client_name)
        .bind(job.status.as_str())
        .bind(&report_raw)
        .bind(&job.parent_id)
        .bind(&number)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;
        tx.commit().await.map_err(AppError::from)?;

        info!(
            target: "veldkeur",
            event = "job_inserted",
            id = %id,
            status = job.status.as_str(),
            inspection_number = %number
        );
        Ok(RemoteJob {
            id,
            client_name: job.client_name,
            status: job.status,
            report_data: job.report_data,
            parent_id: job.parent_id,
            inspection_number: Some(number),
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_job(&self, id: &str, patch: JobPatch) -> AppResult<RemoteJob> {
        let now = now_ms();
        let mut sets = vec!["updated_at = ?".to_string()];
        if patch.client_name.is_some() {
            sets.push("client_name = ?".to_string());
        }
        if patch.status.is_some() {
            sets.push("status = ?".to_string());
        }
        let report_raw = match &patch.report_data {
            Some(payload) => {
                sets.push("report_data = ?".to_string());
                Some(serde_json::to_string(payload).map_err(AppError::from)?)
            }
            None => None,
        };

        let sql = format!(
            "UPDATE inspection_jobs SET {} WHERE id = ?",
            sets.join(", ")
        );
        let mut query = sqlx::query(&sql).bind(now);
        if let Some(client_name) = &patch.client_name {
            query = query.bind(client_name);
        }
        if let Some(status) = &patch.status {
            query = query.bind(status.as_str());
        }
        if let Some(raw) = &report_raw {
            query = query.bind(raw);
        }
        let result = query
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        if result.rows_affected() == 0 {
            return Err(
                AppError::new(JOBS_NOT_FOUND, "Job not found").with_context("id", id.to_string())
            );
        }
        self.get_job(id).await?.ok_or_else(|| {
            AppError::new(JOBS_NOT_FOUND, "Job not found").with_context("id", id.to_string())
        })
    }

    async fn list_children(&self, parent_id: &str) -> AppResult<Vec<RemoteJob>> {
        let rows = sqlx::query(
            "SELECT * FROM inspection_jobs WHERE parent_id = ? AND status = ? \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(parent_id)
        .bind(JobStatus::ContributionReady.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        rows.iter().map(job_from_row).collect()
    }
}
