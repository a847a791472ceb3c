use std::fs;

use veldkeur_lib::model::MetaPatch;
use veldkeur_lib::{InspectionSession, StoreHandle};

#[path = "util.rs"]
mod util;

#[test]
fn session_resumes_from_the_persisted_record() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("record.json");

    {
        let mut session = InspectionSession::load(StoreHandle::file(&path));
        session.set_meta(MetaPatch {
            client_name: Some("Acme BV".into()),
            ..MetaPatch::default()
        });
        session.add_defect(util::defect("d-1", "Hal 1", "Kapot"));
    }

    let resumed = InspectionSession::load(StoreHandle::file(&path));
    assert_eq!(resumed.state().meta.client_name, "Acme BV");
    assert_eq!(resumed.state().defects.len(), 1);
}

#[test]
fn every_mutation_is_written_through() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("record.json");

    let mut session = InspectionSession::load(StoreHandle::file(&path));
    session.set_meta(MetaPatch {
        client_name: Some("Eerste".into()),
        ..MetaPatch::default()
    });
    // A fresh handle reads straight from disk, not from the session.
    let after_first = InspectionSession::load(StoreHandle::file(&path));
    assert_eq!(after_first.state().meta.client_name, "Eerste");

    session.set_meta(MetaPatch {
        client_name: Some("Tweede".into()),
        ..MetaPatch::default()
    });
    let after_second = InspectionSession::load(StoreHandle::file(&path));
    assert_eq!(after_second.state().meta.client_name, "Tweede");
}

#[test]
fn corrupt_record_falls_back_to_the_default_state() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("record.json");
    fs::write(&path, "{ this is not json").expect("write corrupt file");

    let session = InspectionSession::load(StoreHandle::file(&path));
    assert!(session.state().meta.client_name.is_empty());
    assert_eq!(session.state().measurements.boards.len(), 1);
}

#[test]
fn reset_wipes_the_durable_copy() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("record.json");

    let mut session = InspectionSession::load(StoreHandle::file(&path));
    session.set_meta(MetaPatch {
        client_name: Some("Weg ermee".into()),
        ..MetaPatch::default()
    });
    session.reset_state();

    let resumed = InspectionSession::load(StoreHandle::file(&path));
    assert!(resumed.state().meta.client_name.is_empty());
    assert!(resumed.state().defects.is_empty());
}

#[test]
fn loading_a_job_replaces_the_stored_record_entirely() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("record.json");

    let mut session = InspectionSession::load(StoreHandle::file(&path));
    session.add_defect(util::defect("old", "Hal 1", "Oud gebrek"));

    let incoming = util::client_state("Nieuwe klant");
    session.replace_state(incoming);

    let resumed = InspectionSession::load(StoreHandle::file(&path));
    assert_eq!(resumed.state().meta.client_name, "Nieuwe klant");
    assert!(resumed.state().defects.is_empty(), "no merging on load");
}
