#![allow(dead_code)]

use chrono::NaiveDate;
use veldkeur_lib::export;
use veldkeur_lib::jobs::{JobDirectory, JobStatus, MemoryJobDirectory, NewJob, RemoteJob};
use veldkeur_lib::model::{Classification, Defect, InspectionMeta, InspectionState, Instrument};
use veldkeur_lib::{InspectionSession, StoreHandle};

pub fn memory_session() -> InspectionSession {
    InspectionSession::load(StoreHandle::in_memory())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn defect(id: &str, location: &str, description: &str) -> Defect {
    Defect {
        id: id.to_string(),
        library_id: None,
        location: location.to_string(),
        description: description.to_string(),
        classification: Classification::Red,
        action: String::new(),
        photos: Vec::new(),
        category: None,
        subcategory: None,
    }
}

pub fn instrument(id: &str, serial: &str) -> Instrument {
    Instrument {
        id: id.to_string(),
        name: format!("Instrument {id}"),
        serial_number: serial.to_string(),
        calibration_date: None,
    }
}

pub fn client_state(client_name: &str) -> InspectionState {
    InspectionState {
        meta: InspectionMeta {
            client_name: client_name.to_string(),
            ..InspectionMeta::default()
        },
        ..InspectionState::default()
    }
}

/// Insert a fresh job for `client_name` into the directory.
pub async fn seed_job(
    directory: &MemoryJobDirectory,
    client_name: &str,
    status: JobStatus,
) -> RemoteJob {
    directory
        .insert_job(NewJob {
            client_name: client_name.to_string(),
            status,
            report_data: export::export_state(&client_state(client_name)),
            parent_id: None,
        })
        .await
        .expect("seed job")
}
