use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;
use ts_rs::TS;

use crate::error::{AppError, AppResult};
use crate::export::{self, ExportError, ReportPayload};
use crate::id::new_uuid_v7;
use crate::identity::IdentityProvider;
use crate::jobs::{JobDirectory, JobPatch, JobStatus, NewJob, RemoteJob, JOBS_NOT_FOUND};
use crate::model::{
    InspectionState, VALIDATION_CLIENT_NAME_REQUIRED, VALIDATION_INSPECTOR_NAME_REQUIRED,
    VALIDATION_SIGNATURE_REQUIRED,
};
use crate::schedule;
use crate::session::InspectionSession;

pub const CONTRIBUTION_NOT_SYNCED: &str = "CONTRIBUTION/NOT_SYNCED";
pub const CONTRIBUTION_NOT_CLAIMABLE: &str = "CONTRIBUTION/NOT_CLAIMABLE";
pub const CONTRIBUTION_MISSING_PARENT: &str = "CONTRIBUTION/MISSING_PARENT";
pub const CONTRIBUTION_NOT_A_CHILD: &str = "CONTRIBUTION/NOT_A_CHILD";
pub const CONTRIBUTION_NOT_READY: &str = "CONTRIBUTION/NOT_READY";

/// Statuses a job can be claimed from, in either role.
pub const CLAIMABLE: &[JobStatus] = &[
    JobStatus::New,
    JobStatus::InProgress,
    JobStatus::ContributionReady,
];

/// What a merge confirmation dialog shows per candidate.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ContributionSummary {
    pub job_id: String,
    pub contributor: String,
    pub date: Option<NaiveDate>,
    pub defect_count: usize,
    pub board_count: usize,
}

/// Result of folding one contribution into the main record.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MergeStats {
    pub contributor: String,
    pub defects_added: usize,
    pub instruments_added: usize,
    pub boards_added: usize,
}

fn ensure_claimable(job: &RemoteJob) -> AppResult<()> {
    if CLAIMABLE.contains(&job.status) {
        return Ok(());
    }
    Err(
        AppError::new(CONTRIBUTION_NOT_CLAIMABLE, "Job cannot be loaded in this status")
            .with_context("id", job.id.clone())
            .with_context("status", job.status.as_str()),
    )
}

async fn fetch_job(directory: &dyn JobDirectory, job_id: &str) -> AppResult<RemoteJob> {
    directory.get_job(job_id).await?.ok_or_else(|| {
        AppError::new(JOBS_NOT_FOUND, "Job not found").with_context("id", job_id.to_string())
    })
}

/// Take over a job as the main inspector: the record becomes the session's
/// state verbatim, future saves update the same remote row, and the job
/// moves to `in_progress`.
pub async fn load_as_main(
    directory: &dyn JobDirectory,
    session: &mut InspectionSession,
    job_id: &str,
) -> AppResult<RemoteJob> {
    let job = fetch_job(directory, job_id).await?;
    ensure_claimable(&job)?;

    let mut state = export::state_from_payload(&job.report_data)?;
    state.meta.supabase_id = Some(job.id.clone());
    session.replace_state(state);

    let job = if job.status == JobStatus::InProgress {
        job
    } else {
        directory
            .update_job(
                &job.id,
                JobPatch {
                    status: Some(JobStatus::InProgress),
                    ..JobPatch::default()
                },
            )
            .await?
    };
    info!(target: "veldkeur", event = "job_claimed", role = "main", id = %job.id);
    Ok(job)
}

/// Build the disjoint record a contributor starts from. The parent's
/// client and installation header carries over; everything the contributor
/// is expected to produce starts empty, and the parent's identity,
/// signature and accumulated work never enter the contributor's record.
pub fn branch_for_contribution(parent: &RemoteJob, today: NaiveDate) -> AppResult<InspectionState> {
    ensure_claimable(parent)?;
    let mut state = export::state_from_payload(&parent.report_data)?;

    state.defects.clear();
    state.measurements.boards.clear();
    state.measurements.selected_instruments.clear();
    state.custom_instruments.clear();

    state.meta.inspector_name.clear();
    state.meta.scios_registration_number.clear();
    state.meta.signature = None;
    state.meta.additional_inspectors.clear();

    state.meta.is_contribution_mode = true;
    state.meta.parent_inspection_id = Some(parent.id.clone());
    state.meta.parent_inspection_number = parent.inspection_number.clone();
    state.meta.supabase_id = None;
    state.meta.date = Some(today);
    schedule::recompute(&mut state.meta);
    Ok(state)
}

/// Claim a job as a contributor. The parent's remote status is untouched;
/// only an eventual merge brings the work back.
pub async fn load_as_contributor(
    directory: &dyn JobDirectory,
    session: &mut InspectionSession,
    job_id: &str,
    today: NaiveDate,
) -> AppResult<RemoteJob> {
    let job = fetch_job(directory, job_id).await?;
    let state = branch_for_contribution(&job, today)?;
    session.replace_state(state);
    info!(target: "veldkeur", event = "job_claimed", role = "contributor", id = %job.id);
    Ok(job)
}

fn require_inspector_name(
    state: &InspectionState,
    identity: &dyn IdentityProvider,
) -> AppResult<()> {
    if !state.meta.inspector_name.trim().is_empty() {
        return Ok(());
    }
    let mut err = AppError::new(
        VALIDATION_INSPECTOR_NAME_REQUIRED,
        "Inspector name is required before uploading",
    );
    if let Some(user) = identity.current_user() {
        err = err.with_context("suggested_inspector_name", user.email);
    }
    Err(err)
}

fn contribution_label(state: &InspectionState) -> String {
    match state.meta.parent_inspection_number.as_deref() {
        Some(number) => format!("{} (bijdrage bij {})", state.meta.client_name, number),
        None => format!("{} (bijdrage)", state.meta.client_name),
    }
}

/// Upload the current record. A contribution session always inserts a new
/// child job in `contribution_ready`; a main session inserts on first
/// upload (requires client name, inspector name and signature) and updates
/// by remote id afterwards.
pub async fn submit(
    directory: &dyn JobDirectory,
    session: &mut InspectionSession,
    identity: &dyn IdentityProvider,
) -> AppResult<RemoteJob> {
    let state = session.state().clone();
    if state.meta.client_name.trim().is_empty() {
        return Err(AppError::new(
            VALIDATION_CLIENT_NAME_REQUIRED,
            "Client name is required before uploading",
        ));
    }

    if state.meta.is_contribution_mode {
        let parent_id = state.meta.parent_inspection_id.clone().ok_or_else(|| {
            AppError::new(CONTRIBUTION_MISSING_PARENT, "Contribution has no parent job")
        })?;
        require_inspector_name(&state, identity)?;

        let job = directory
            .insert_job(NewJob {
                client_name: contribution_label(&state),
                status: JobStatus::ContributionReady,
                report_data: export::export_state(&state),
                parent_id: Some(parent_id.clone()),
            })
            .await?;
        info!(
            target: "veldkeur",
            event = "contribution_submitted",
            id = %job.id,
            parent_id = %parent_id
        );
        return Ok(job);
    }

    match state.meta.supabase_id.clone() {
        Some(remote_id) => {
            let job = directory
                .update_job(
                    &remote_id,
                    JobPatch {
                        client_name: Some(state.meta.client_name.clone()),
                        report_data: Some(export::export_state(&state)),
                        ..JobPatch::default()
                    },
                )
                .await?;
            info!(target: "veldkeur", event = "job_updated", id = %job.id);
            Ok(job)
        }
        None => {
            require_inspector_name(&state, identity)?;
            if state.meta.signature.as_deref().unwrap_or("").is_empty() {
                return Err(AppError::new(
                    VALIDATION_SIGNATURE_REQUIRED,
                    "A signature is required before the report can be submitted for review",
                ));
            }
            let job = directory
                .insert_job(NewJob {
                    client_name: state.meta.client_name.clone(),
                    status: JobStatus::ReviewReady,
                    report_data: export::export_state(&state),
                    parent_id: None,
                })
                .await?;
            session.set_remote_identity(job.id.clone());
            info!(target: "veldkeur", event = "job_submitted", id = %job.id);
            Ok(job)
        }
    }
}

fn summarize(job: &RemoteJob) -> Result<ContributionSummary, ExportError> {
    let meta = job.report_data.meta.as_ref().ok_or(ExportError::MissingMeta)?;
    Ok(ContributionSummary {
        job_id: job.id.clone(),
        contributor: meta.inspector_name.clone(),
        date: meta.date,
        defect_count: job.report_data.defects.as_ref().map_or(0, Vec::len),
        board_count: job
            .report_data
            .measurements
            .as_ref()
            .map_or(0, |m| m.boards.len()),
    })
}

fn main_remote_id(session: &InspectionSession) -> AppResult<String> {
    session.state().meta.supabase_id.clone().ok_or_else(|| {
        AppError::new(
            CONTRIBUTION_NOT_SYNCED,
            "The record must be synced before contributions can be merged",
        )
    })
}

/// Candidates for a merge, in store return order. The operator confirms or
/// skips each one individually.
pub async fn list_contributions(
    directory: &dyn JobDirectory,
    session: &InspectionSession,
) -> AppResult<Vec<ContributionSummary>> {
    let parent_id = main_remote_id(session)?;
    let children = directory.list_children(&parent_id).await?;
    children
        .iter()
        .map(|job| summarize(job).map_err(AppError::from))
        .collect()
}

/// Fold one contribution's data into the main record. Fresh ids rule out
/// collisions with the main line, the attribution tag records provenance in
/// the description, and instruments deduplicate on serial number.
pub fn apply_contribution(
    state: &mut InspectionState,
    payload: &ReportPayload,
) -> Result<MergeStats, ExportError> {
    let meta = payload.meta.as_ref().ok_or(ExportError::MissingMeta)?;
    let contributor = meta.inspector_name.trim();
    if contributor.is_empty() {
        return Err(ExportError::MissingInspector);
    }

    if contributor != state.meta.inspector_name
        && !state
            .meta
            .additional_inspectors
            .iter()
            .any(|name| name == contributor)
    {
        state
            .meta
            .additional_inspectors
            .push(contributor.to_string());
    }

    let tag = format!("[BIJDRAGE {}]: ", contributor.to_uppercase());
    let mut stats = MergeStats {
        contributor: contributor.to_string(),
        defects_added: 0,
        instruments_added: 0,
        boards_added: 0,
    };

    for defect in payload.defects.iter().flatten() {
        let mut defect = defect.clone();
        defect.id = new_uuid_v7();
        defect.description = format!("{tag}{}", defect.description);
        state.defects.push(defect);
        stats.defects_added += 1;
    }

    if let Some(measurements) = payload.measurements.as_ref() {
        for instrument in &measurements.selected_instruments {
            let duplicate = state
                .measurements
                .selected_instruments
                .iter()
                .any(|existing| existing.serial_number == instrument.serial_number);
            if duplicate {
                continue;
            }
            state
                .measurements
                .selected_instruments
                .push(instrument.clone());
            stats.instruments_added += 1;
        }

        for board in &measurements.boards {
            let mut board = board.clone();
            board.id = new_uuid_v7();
            board.name = format!("{} (v. {})", board.name, contributor);
            state.measurements.boards.push(board);
            stats.boards_added += 1;
        }
    }

    Ok(stats)
}

/// Merge one confirmed candidate. The candidate must still be a
/// `contribution_ready` child of the session's job; afterwards it is marked
/// `merged` and never offered again.
pub async fn merge_contribution(
    directory: &dyn JobDirectory,
    session: &mut InspectionSession,
    contribution_id: &str,
) -> AppResult<MergeStats> {
    let parent_id = main_remote_id(session)?;
    let job = fetch_job(directory, contribution_id).await?;
    if job.parent_id.as_deref() != Some(parent_id.as_str()) {
        return Err(
            AppError::new(CONTRIBUTION_NOT_A_CHILD, "Job is not a contribution to this record")
                .with_context("id", job.id.clone()),
        );
    }
    if job.status != JobStatus::ContributionReady {
        return Err(
            AppError::new(CONTRIBUTION_NOT_READY, "Contribution was already merged or withdrawn")
                .with_context("id", job.id.clone())
                .with_context("status", job.status.as_str()),
        );
    }

    let stats = session.merge_state(&job.report_data)?;
    directory
        .update_job(
            contribution_id,
            JobPatch {
                status: Some(JobStatus::Merged),
                ..JobPatch::default()
            },
        )
        .await?;
    info!(
        target: "veldkeur",
        event = "contribution_merged",
        id = %contribution_id,
        contributor = %stats.contributor,
        defects = stats.defects_added,
        boards = stats.boards_added,
        instruments = stats.instruments_added
    );
    Ok(stats)
}
