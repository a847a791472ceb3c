#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlx::Row;
use std::path::PathBuf;
use veldkeur_lib::jobs::sqlite::{apply_schema, open_job_pool};
use veldkeur_lib::jobs::{JobDirectory, SqliteJobDirectory};

#[derive(Parser)]
#[command(name = "jobs_admin", about = "Veldkeur job directory helper")]
struct Cli {
    /// Optional explicit DB path
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Create the job directory schema if it does not exist
    #[command(about, long_about = None)]
    Init,
    /// Show job counts per lifecycle status
    #[command(about, long_about = None)]
    Status,
    /// List recent jobs, newest first
    #[command(about, long_about = None)]
    List {
        /// Maximum number of jobs to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    veldkeur_lib::logging::init();

    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or(default_db_path()?);

    match cli.cmd {
        Cmd::Init => init(&db_path).await,
        Cmd::Status => status(&db_path).await,
        Cmd::List { limit } => list(&db_path, limit).await,
    }
}

fn default_db_path() -> Result<PathBuf> {
    let base = dirs::data_dir().unwrap_or(std::env::current_dir()?);
    Ok(base.join("veldkeur").join("jobs.sqlite3"))
}

async fn init(db_path: &PathBuf) -> Result<()> {
    let pool = open_job_pool(db_path).await.context("open job database")?;
    apply_schema(&pool).await.context("apply schema")?;
    println!("job directory ready at {}", db_path.display());
    Ok(())
}

async fn status(db_path: &PathBuf) -> Result<()> {
    let pool = open_job_pool(db_path).await.context("open job database")?;
    apply_schema(&pool).await.context("apply schema")?;
    let rows = sqlx::query(
        "SELECT status, COUNT(*) AS n FROM inspection_jobs GROUP BY status ORDER BY status",
    )
    .fetch_all(&pool)
    .await?;
    if rows.is_empty() {
        println!("no jobs");
        return Ok(());
    }
    for row in rows {
        let status: String = row.try_get("status")?;
        let n: i64 = row.try_get("n")?;
        println!("{status:<20} {n}");
    }
    Ok(())
}

async fn list(db_path: &PathBuf, limit: usize) -> Result<()> {
    let pool = open_job_pool(db_path).await.context("open job database")?;
    apply_schema(&pool).await.context("apply schema")?;
    let directory = SqliteJobDirectory::new(pool);
    let jobs = directory
        .list_jobs(&[])
        .await
        .map_err(anyhow::Error::from)?;
    for job in jobs.iter().take(limit) {
        println!(
            "{}  {:<20} {:<18} parent={}",
            job.inspection_number.as_deref().unwrap_or("-"),
            job.status.as_str(),
            job.client_name,
            job.parent_id.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
