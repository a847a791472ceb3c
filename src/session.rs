use tracing::warn;

use crate::contribution::{self, MergeStats};
use crate::error::AppResult;
use crate::export::{self, ReportPayload};
use crate::id::new_uuid_v7;
use crate::library;
use crate::model::{
    Board, BoardPatch, Defect, InspectionState, Instrument, LibraryDefect, MeasurementsPatch,
    MetaPatch,
};
use crate::sample_size::{self, SampleBand};
use crate::schedule;
use crate::store::StoreHandle;

/// The single active inspection record. The session owns the in-memory
/// state and mirrors it into the store after every mutation, so the durable
/// copy never lags by more than one change.
///
/// The store handle is injected; nothing here is process-global, and tests
/// run any number of sessions side by side.
pub struct InspectionSession {
    state: InspectionState,
    store: StoreHandle,
}

impl InspectionSession {
    /// Resume from the last persisted state, or start from the default
    /// record when nothing was stored or the stored payload does not parse.
    pub fn load(store: StoreHandle) -> Self {
        let state = match store.read_active() {
            Some(raw) => match serde_json::from_str::<InspectionState>(&raw) {
                Ok(mut state) => {
                    schedule::recompute(&mut state.meta);
                    state
                }
                Err(err) => {
                    warn!(
                        target: "veldkeur",
                        event = "state_parse_failed",
                        error = %err
                    );
                    InspectionState::default()
                }
            },
            None => InspectionState::default(),
        };
        InspectionSession { state, store }
    }

    pub fn state(&self) -> &InspectionState {
        &self.state
    }

    /// Write-through persistence. A failed persist is a warning, not an
    /// error; the in-memory session keeps going and retries on the next
    /// mutation.
    fn persist(&self) {
        match serde_json::to_string(&self.state) {
            Ok(raw) => {
                self.store.write_active(&raw);
                if let Err(err) = self.store.persist() {
                    warn!(
                        target: "veldkeur",
                        event = "state_persist_failed",
                        error = %err
                    );
                }
            }
            Err(err) => {
                warn!(
                    target: "veldkeur",
                    event = "state_serialize_failed",
                    error = %err
                );
            }
        }
    }

    pub fn set_meta(&mut self, patch: MetaPatch) {
        patch.apply(&mut self.state.meta);
        schedule::recompute(&mut self.state.meta);
        self.persist();
    }

    pub fn set_measurements(&mut self, patch: MeasurementsPatch) {
        patch.apply(&mut self.state.measurements);
        self.persist();
    }

    pub fn set_usage_function(&mut self, key: &str, value: bool) {
        self.state
            .meta
            .usage_functions
            .insert(key.to_string(), value);
        self.persist();
    }

    pub fn add_defect(&mut self, defect: Defect) {
        self.state.defects.push(defect);
        self.persist();
    }

    /// Replacing an unknown id is a no-op.
    pub fn update_defect(&mut self, id: &str, mut defect: Defect) {
        if let Some(slot) = self.state.defects.iter_mut().find(|d| d.id == id) {
            defect.id = id.to_string();
            *slot = defect;
            self.persist();
        }
    }

    pub fn remove_defect(&mut self, id: &str) {
        self.state.defects.retain(|d| d.id != id);
        self.persist();
    }

    /// Adding an already-selected instrument is a no-op.
    pub fn add_instrument(&mut self, instrument: Instrument) {
        let selected = &mut self.state.measurements.selected_instruments;
        if selected.iter().any(|i| i.id == instrument.id) {
            return;
        }
        selected.push(instrument);
        self.persist();
    }

    pub fn remove_instrument(&mut self, id: &str) {
        self.state
            .measurements
            .selected_instruments
            .retain(|i| i.id != id);
        self.persist();
    }

    pub fn add_custom_instrument(&mut self, instrument: Instrument) {
        self.state.custom_instruments.push(instrument);
        self.persist();
    }

    /// Create a board with placeholder values and return its id.
    pub fn add_board(&mut self) -> String {
        let index = self.state.measurements.boards.len() + 1;
        let board = Board::placeholder(index);
        let id = board.id.clone();
        self.state.measurements.boards.push(board);
        self.persist();
        id
    }

    pub fn update_board(&mut self, id: &str, patch: BoardPatch) {
        if let Some(board) = self
            .state
            .measurements
            .boards
            .iter_mut()
            .find(|b| b.id == id)
        {
            patch.apply(board);
            self.persist();
        }
    }

    /// The shell only offers deletion while another board remains, so a
    /// record keeps at least one board once any exist.
    pub fn remove_board(&mut self, id: &str) {
        self.state.measurements.boards.retain(|b| b.id != id);
        self.persist();
    }

    /// Wholesale replacement; `None` restores the built-in catalogue.
    pub fn set_custom_library(&mut self, library: Option<Vec<LibraryDefect>>) {
        self.state.custom_library = library;
        self.persist();
    }

    /// The active defect catalogue: the imported set when present,
    /// otherwise the built-in one.
    pub fn library(&self) -> &[LibraryDefect] {
        match &self.state.custom_library {
            Some(custom) => custom,
            None => library::default_library(),
        }
    }

    /// Wholesale replacement of the record from an interchange payload.
    /// Fails loudly without touching the current state when the payload is
    /// malformed.
    pub fn import_state(&mut self, payload: &ReportPayload) -> AppResult<()> {
        let state = export::state_from_payload(payload)?;
        self.state = state;
        self.persist();
        Ok(())
    }

    /// Additive reconciliation of one contribution payload, distinct from
    /// `import_state`: nothing is replaced, defects and boards come in
    /// under fresh ids, and instruments deduplicate on serial number.
    pub fn merge_state(&mut self, payload: &ReportPayload) -> AppResult<MergeStats> {
        let stats = contribution::apply_contribution(&mut self.state, payload)?;
        self.persist();
        Ok(stats)
    }

    /// Back to the default record, as on a fresh install. The durable copy
    /// is wiped first and then re-seeded.
    pub fn reset_state(&mut self) {
        self.state = InspectionState::default();
        self.store.clear_active();
        self.persist();
    }

    /// Replace the whole record, used when a remote job is loaded. The
    /// previous record is gone afterwards; there is no merging here.
    pub fn replace_state(&mut self, state: InspectionState) {
        self.state = state;
        self.persist();
    }

    /// Record the remote identity after the first successful insert so
    /// later saves update instead of inserting.
    pub(crate) fn set_remote_identity(&mut self, remote_id: String) {
        self.state.meta.supabase_id = Some(remote_id);
        self.persist();
    }

    /// Sampling hint for the current component count, shown next to the
    /// total-components field.
    pub fn required_sample(&self) -> SampleBand {
        sample_size::sample_size_row(self.state.meta.total_components)
    }

    pub fn defect_from_library(&self, library_id: &str, location: &str, addendum: &str) -> Option<Defect> {
        let entry = self.library().iter().find(|e| e.id == library_id)?;
        let description = if addendum.trim().is_empty() {
            entry.description.clone()
        } else {
            format!("{} {}", entry.description, addendum.trim())
        };
        Some(Defect {
            id: new_uuid_v7(),
            library_id: Some(entry.id.clone()),
            location: location.to_string(),
            description,
            classification: entry.classification,
            action: entry.action.clone(),
            photos: Vec::new(),
            category: Some(entry.category.clone()),
            subcategory: Some(entry.subcategory.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn session() -> InspectionSession {
        InspectionSession::load(StoreHandle::in_memory())
    }

    fn instrument(id: &str, serial: &str) -> Instrument {
        Instrument {
            id: id.to_string(),
            name: format!("Instrument {id}"),
            serial_number: serial.to_string(),
            calibration_date: None,
        }
    }

    #[test]
    fn adding_same_instrument_twice_keeps_one_entry() {
        let mut session = session();
        session.add_instrument(instrument("a", "S-1"));
        session.add_instrument(instrument("a", "S-1"));
        let selected = &session.state().measurements.selected_instruments;
        assert_eq!(selected.iter().filter(|i| i.id == "a").count(), 1);
    }

    #[test]
    fn update_defect_with_unknown_id_is_a_noop() {
        let mut session = session();
        let ghost = Defect {
            id: "ghost".into(),
            library_id: None,
            location: String::new(),
            description: "nope".into(),
            classification: crate::model::Classification::Blue,
            action: String::new(),
            photos: Vec::new(),
            category: None,
            subcategory: None,
        };
        session.update_defect("missing", ghost);
        assert!(session.state().defects.is_empty());
    }

    #[test]
    fn meta_mutation_recomputes_next_inspection_date() {
        let mut session = session();
        session.set_meta(MetaPatch {
            date: Some(NaiveDate::from_ymd_opt(2026, 6, 1)),
            inspection_interval_years: Some(Some(5)),
            ..MetaPatch::default()
        });
        assert_eq!(
            session.state().meta.next_inspection_date,
            NaiveDate::from_ymd_opt(2031, 6, 1)
        );

        session.set_meta(MetaPatch {
            inspection_interval_years: Some(None),
            ..MetaPatch::default()
        });
        assert!(session.state().meta.next_inspection_date.is_none());
    }

    #[test]
    fn usage_function_toggles_one_flag() {
        let mut session = session();
        session.set_usage_function("kantoorfunctie", true);
        session.set_usage_function("woonfunctie", false);
        assert_eq!(
            session.state().meta.usage_functions.get("kantoorfunctie"),
            Some(&true)
        );
        assert_eq!(
            session.state().meta.usage_functions.get("woonfunctie"),
            Some(&false)
        );
        assert_eq!(session.state().meta.usage_functions.len(), 2);
    }

    #[test]
    fn reset_restores_default_record() {
        let mut session = session();
        session.set_meta(MetaPatch {
            client_name: Some("Acme".into()),
            ..MetaPatch::default()
        });
        session.reset_state();
        let state = session.state();
        assert!(state.meta.client_name.is_empty());
        assert!(state.defects.is_empty());
        assert_eq!(state.measurements.boards.len(), 1);
    }

    #[test]
    fn sample_hint_follows_component_count() {
        let mut session = session();
        session.set_meta(MetaPatch {
            total_components: Some(120),
            ..MetaPatch::default()
        });
        let band = session.required_sample();
        assert_eq!(band.sample_size, 20);
        assert_eq!(band.population_label, "91 t/m 150");
    }

    #[test]
    fn custom_library_replaces_and_reverts() {
        let mut session = session();
        assert!(!session.library().is_empty());
        let custom = vec![LibraryDefect {
            id: "c-1".into(),
            category: "Eigen".into(),
            subcategory: String::new(),
            name: "Eigen gebrek".into(),
            description: "Eigen omschrijving".into(),
            classification: crate::model::Classification::Yellow,
            action: "Herstellen".into(),
        }];
        session.set_custom_library(Some(custom.clone()));
        assert_eq!(session.library(), custom.as_slice());
        session.set_custom_library(None);
        assert_eq!(session.library().len(), library::default_library().len());
    }

    #[test]
    fn defect_from_library_concatenates_addendum() {
        let session = session();
        let entry = library::default_library().first().expect("seeded library");
        let defect = session
            .defect_from_library(&entry.id, "Hal 1", "Linker veld.")
            .expect("known entry");
        assert!(defect.description.starts_with(&entry.description));
        assert!(defect.description.ends_with("Linker veld."));
        assert_eq!(defect.library_id.as_deref(), Some(entry.id.as_str()));
    }

    #[test]
    fn import_replaces_previous_record() {
        let mut session = session();
        session.set_meta(MetaPatch {
            client_name: Some("Before".into()),
            ..MetaPatch::default()
        });

        let incoming = InspectionState {
            meta: crate::model::InspectionMeta {
                client_name: "After".into(),
                ..Default::default()
            },
            ..InspectionState::default()
        };
        session
            .import_state(&export::export_state(&incoming))
            .expect("import");
        assert_eq!(session.state().meta.client_name, "After");
    }
}
