use veldkeur_lib::contribution::{self, CONTRIBUTION_NOT_READY, CONTRIBUTION_NOT_SYNCED};
use veldkeur_lib::export;
use veldkeur_lib::jobs::{JobDirectory, JobStatus, MemoryJobDirectory, NewJob};
use veldkeur_lib::model::{InspectionMeta, InspectionState};
use veldkeur_lib::ReportPayload;

#[path = "util.rs"]
mod util;

fn contribution_payload(
    parent_id: &str,
    inspector: &str,
    build: impl FnOnce(&mut InspectionState),
) -> ReportPayload {
    let mut state = InspectionState {
        meta: InspectionMeta {
            client_name: "Acme BV".into(),
            inspector_name: inspector.into(),
            is_contribution_mode: true,
            parent_inspection_id: Some(parent_id.into()),
            ..InspectionMeta::default()
        },
        ..InspectionState::default()
    };
    state.measurements.boards.clear();
    build(&mut state);
    export::export_state(&state)
}

async fn synced_main_session(
    directory: &MemoryJobDirectory,
) -> (veldkeur_lib::InspectionSession, String) {
    let parent = util::seed_job(directory, "Acme BV", JobStatus::New).await;
    let mut session = util::memory_session();
    contribution::load_as_main(directory, &mut session, &parent.id)
        .await
        .expect("claim as main");
    (session, parent.id)
}

#[tokio::test]
async fn merged_defects_get_fresh_ids_and_attribution() {
    let directory = MemoryJobDirectory::new();
    let (mut session, parent_id) = synced_main_session(&directory).await;
    session.add_defect(util::defect("main-1", "Hal 1", "Bestaand gebrek"));

    let payload = contribution_payload(&parent_id, "J. de Vries", |state| {
        state.defects.push(util::defect("d1", "Hal 2", "Kapot"));
        state.defects.push(util::defect("d2", "Hal 3", "Los"));
    });
    let child = directory
        .insert_job(NewJob {
            client_name: "Acme BV (bijdrage)".into(),
            status: JobStatus::ContributionReady,
            report_data: payload,
            parent_id: Some(parent_id.clone()),
        })
        .await
        .expect("insert child");

    let stats = contribution::merge_contribution(&directory, &mut session, &child.id)
        .await
        .expect("merge");
    assert_eq!(stats.defects_added, 2);

    let defects = &session.state().defects;
    assert_eq!(defects.len(), 3);
    let merged: Vec<_> = defects.iter().filter(|d| d.id != "main-1").collect();
    for defect in &merged {
        assert_ne!(defect.id, "d1");
        assert_ne!(defect.id, "d2");
        assert!(defect.description.starts_with("[BIJDRAGE J. DE VRIES]: "));
    }
    let mut ids: Vec<_> = defects.iter().map(|d| d.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3, "merged ids must not collide");
}

#[tokio::test]
async fn merge_dedups_instruments_on_serial_number() {
    let directory = MemoryJobDirectory::new();
    let (mut session, parent_id) = synced_main_session(&directory).await;
    session.add_instrument(util::instrument("main-inst", "SN-1"));

    let payload = contribution_payload(&parent_id, "J. de Vries", |state| {
        state
            .measurements
            .selected_instruments
            .push(util::instrument("other-id", "SN-1"));
        state
            .measurements
            .selected_instruments
            .push(util::instrument("new-id", "SN-2"));
    });
    let child = directory
        .insert_job(NewJob {
            client_name: "Acme BV (bijdrage)".into(),
            status: JobStatus::ContributionReady,
            report_data: payload,
            parent_id: Some(parent_id.clone()),
        })
        .await
        .expect("insert child");

    let stats = contribution::merge_contribution(&directory, &mut session, &child.id)
        .await
        .expect("merge");
    assert_eq!(stats.instruments_added, 1);

    let selected = &session.state().measurements.selected_instruments;
    assert_eq!(selected.len(), 2);
    assert_eq!(
        selected
            .iter()
            .filter(|i| i.serial_number == "SN-1")
            .count(),
        1
    );
}

#[tokio::test]
async fn merged_boards_are_renamed_and_rekeyed() {
    let directory = MemoryJobDirectory::new();
    let (mut session, parent_id) = synced_main_session(&directory).await;

    let payload = contribution_payload(&parent_id, "J. de Vries", |state| {
        let mut board = veldkeur_lib::Board::placeholder(1);
        board.id = "contrib-board".into();
        board.name = "Onderverdeler kelder".into();
        state.measurements.boards.push(board);
    });
    let child = directory
        .insert_job(NewJob {
            client_name: "Acme BV (bijdrage)".into(),
            status: JobStatus::ContributionReady,
            report_data: payload,
            parent_id: Some(parent_id.clone()),
        })
        .await
        .expect("insert child");

    let before = session.state().measurements.boards.len();
    contribution::merge_contribution(&directory, &mut session, &child.id)
        .await
        .expect("merge");

    let boards = &session.state().measurements.boards;
    assert_eq!(boards.len(), before + 1);
    let merged = boards.last().expect("merged board");
    assert_ne!(merged.id, "contrib-board");
    assert_eq!(merged.name, "Onderverdeler kelder (v. J. de Vries)");
}

#[tokio::test]
async fn contributor_name_lands_in_additional_inspectors_once() {
    let directory = MemoryJobDirectory::new();
    let (mut session, parent_id) = synced_main_session(&directory).await;

    for n in 0..2 {
        let payload = contribution_payload(&parent_id, "J. de Vries", |state| {
            state.defects.push(util::defect("d", "Hal", "Kapot"));
        });
        let child = directory
            .insert_job(NewJob {
                client_name: format!("Acme BV (bijdrage {n})"),
                status: JobStatus::ContributionReady,
                report_data: payload,
                parent_id: Some(parent_id.clone()),
            })
            .await
            .expect("insert child");
        contribution::merge_contribution(&directory, &mut session, &child.id)
            .await
            .expect("merge");
    }

    assert_eq!(
        session.state().meta.additional_inspectors,
        vec!["J. de Vries".to_string()]
    );
}

#[tokio::test]
async fn a_merged_contribution_is_not_offered_or_merged_again() {
    let directory = MemoryJobDirectory::new();
    let (mut session, parent_id) = synced_main_session(&directory).await;

    let payload = contribution_payload(&parent_id, "J. de Vries", |state| {
        state.defects.push(util::defect("d", "Hal", "Kapot"));
    });
    let child = directory
        .insert_job(NewJob {
            client_name: "Acme BV (bijdrage)".into(),
            status: JobStatus::ContributionReady,
            report_data: payload,
            parent_id: Some(parent_id.clone()),
        })
        .await
        .expect("insert child");

    assert_eq!(
        contribution::list_contributions(&directory, &session)
            .await
            .expect("list")
            .len(),
        1
    );
    contribution::merge_contribution(&directory, &mut session, &child.id)
        .await
        .expect("first merge");

    assert!(contribution::list_contributions(&directory, &session)
        .await
        .expect("list after merge")
        .is_empty());

    let err = contribution::merge_contribution(&directory, &mut session, &child.id)
        .await
        .expect_err("second merge refused");
    assert_eq!(err.code(), CONTRIBUTION_NOT_READY);
    assert_eq!(session.state().defects.len(), 1, "no double application");
}

#[tokio::test]
async fn merge_requires_a_synced_main_record() {
    let directory = MemoryJobDirectory::new();
    let session = util::memory_session();
    let err = contribution::list_contributions(&directory, &session)
        .await
        .expect_err("unsynced record cannot merge");
    assert_eq!(err.code(), CONTRIBUTION_NOT_SYNCED);
}

#[tokio::test]
async fn contribution_without_inspector_name_fails_loudly_and_applies_nothing() {
    let directory = MemoryJobDirectory::new();
    let (mut session, parent_id) = synced_main_session(&directory).await;

    let payload = contribution_payload(&parent_id, "", |state| {
        state.defects.push(util::defect("d", "Hal", "Kapot"));
    });
    let child = directory
        .insert_job(NewJob {
            client_name: "Acme BV (bijdrage)".into(),
            status: JobStatus::ContributionReady,
            report_data: payload,
            parent_id: Some(parent_id.clone()),
        })
        .await
        .expect("insert child");

    let before = session.state().clone();
    let err = contribution::merge_contribution(&directory, &mut session, &child.id)
        .await
        .expect_err("missing inspector name");
    assert_eq!(err.code(), "EXPORT/MISSING_INSPECTOR");
    assert_eq!(session.state(), &before, "failed merge applies nothing");

    // The candidate is still waiting, not consumed by the failure.
    let remote = directory
        .get_job(&child.id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(remote.status, JobStatus::ContributionReady);
}
