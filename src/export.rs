use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::error::AppError;
use crate::model::{Defect, InspectionMeta, InspectionState, Instrument, Measurements};
use crate::schedule;

/// Version written into every payload this build produces. The field was
/// absent historically, so readers accept payloads without one.
pub const FORMAT_VERSION: &str = "1.0.0";

/// The interchange shape: backup files, share payloads and the
/// `report_data` column of a remote job all carry exactly this object.
/// Every data key may be absent; consumers fall back to defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReportPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<InspectionMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurements: Option<Measurements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defects: Option<Vec<Defect>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instruments: Option<Vec<Instrument>>,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported format version {found}; this build reads major {supported}")]
    UnsupportedVersion { found: String, supported: u64 },
    #[error("payload carries an invalid format version: {0}")]
    InvalidVersion(String),
    #[error("payload has no meta object")]
    MissingMeta,
    #[error("contribution linkage is inconsistent: parent id and contribution flag disagree")]
    InconsistentLinkage,
    #[error("contribution payload has no inspector name")]
    MissingInspector,
}

impl From<ExportError> for AppError {
    fn from(error: ExportError) -> Self {
        let code = match &error {
            ExportError::Json(_) => "EXPORT/PARSE",
            ExportError::UnsupportedVersion { .. } => "EXPORT/UNSUPPORTED_VERSION",
            ExportError::InvalidVersion(_) => "EXPORT/INVALID_VERSION",
            ExportError::MissingMeta => "EXPORT/MISSING_META",
            ExportError::InconsistentLinkage => "EXPORT/INCONSISTENT_LINKAGE",
            ExportError::MissingInspector => "EXPORT/MISSING_INSPECTOR",
        };
        AppError::new(code, error.to_string())
    }
}

/// Serialize the full in-memory record into the canonical wire shape. The
/// custom library stays local and is never exported.
pub fn export_state(state: &InspectionState) -> ReportPayload {
    ReportPayload {
        format_version: Some(FORMAT_VERSION.to_string()),
        meta: Some(state.meta.clone()),
        measurements: Some(state.measurements.clone()),
        defects: Some(state.defects.clone()),
        custom_instruments: Some(state.custom_instruments.clone()),
    }
}

pub fn to_json(state: &InspectionState) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&export_state(state))?)
}

pub fn parse_payload(raw: &str) -> Result<ReportPayload, ExportError> {
    let payload: ReportPayload = serde_json::from_str(raw)?;
    check_version(&payload)?;
    Ok(payload)
}

/// Payloads without a version predate the tag and are accepted. A newer
/// major than ours is refused rather than half-read.
pub fn check_version(payload: &ReportPayload) -> Result<(), ExportError> {
    let Some(found) = payload.format_version.as_deref() else {
        return Ok(());
    };
    let found_version =
        Version::parse(found).map_err(|_| ExportError::InvalidVersion(found.to_string()))?;
    let supported = Version::parse(FORMAT_VERSION)
        .map_err(|_| ExportError::InvalidVersion(FORMAT_VERSION.to_string()))?;
    if found_version.major > supported.major {
        return Err(ExportError::UnsupportedVersion {
            found: found.to_string(),
            supported: supported.major,
        });
    }
    Ok(())
}

/// Rebuild a full record from a payload, the operation behind both
/// `import_state` and loading a remote job. The meta object is required;
/// every other key defaults. Nothing is applied on error.
pub fn state_from_payload(payload: &ReportPayload) -> Result<InspectionState, ExportError> {
    check_version(payload)?;
    let meta = payload.meta.clone().ok_or(ExportError::MissingMeta)?;
    if !meta.linkage_consistent() {
        return Err(ExportError::InconsistentLinkage);
    }
    let mut state = InspectionState {
        meta,
        measurements: payload.measurements.clone().unwrap_or_default(),
        defects: payload.defects.clone().unwrap_or_default(),
        custom_instruments: payload.custom_instruments.clone().unwrap_or_default(),
        custom_library: None,
    };
    schedule::recompute(&mut state.meta);
    Ok(state)
}
