use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::id::new_uuid_v7;

pub const VALIDATION_CLIENT_NAME_REQUIRED: &str = "VALIDATION/CLIENT_NAME_REQUIRED";
pub const VALIDATION_INSPECTOR_NAME_REQUIRED: &str = "VALIDATION/INSPECTOR_NAME_REQUIRED";
pub const VALIDATION_SIGNATURE_REQUIRED: &str = "VALIDATION/SIGNATURE_REQUIRED";

/// Usage functions of the inspected building, rendered as checkboxes by the
/// shell. The flag map accepts arbitrary keys; this list drives the form.
pub const USAGE_FUNCTIONS: &[&str] = &[
    "woonfunctie",
    "bijeenkomstfunctie",
    "industriefunctie",
    "kantoorfunctie",
    "logiesfunctie",
    "onderwijsfunctie",
    "winkelfunctie",
    "overige_gebruiksfunctie",
];

/// Finding severity, most severe first in reports. `Amber` is a legacy
/// spelling of `Orange` still present in older payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Classification {
    Blue,
    Yellow,
    #[serde(alias = "Amber")]
    Orange,
    Red,
}

impl Classification {
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Red => "Red",
            Classification::Orange => "Orange",
            Classification::Yellow => "Yellow",
            Classification::Blue => "Blue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Board {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub temperature_celsius: Option<f64>,
    #[serde(default)]
    pub insulation_mohm: Option<f64>,
    #[serde(default)]
    pub impedance_ohm: Option<f64>,
}

impl Board {
    /// A board starts with placeholder values and is filled in on site.
    pub fn placeholder(index: usize) -> Self {
        Board {
            id: new_uuid_v7(),
            name: format!("Verdeler {index}"),
            temperature_celsius: None,
            insulation_mohm: None,
            impedance_ohm: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BoardPatch {
    pub name: Option<String>,
    pub temperature_celsius: Option<Option<f64>>,
    pub insulation_mohm: Option<Option<f64>>,
    pub impedance_ohm: Option<Option<f64>>,
}

impl BoardPatch {
    pub fn apply(self, board: &mut Board) {
        if let Some(name) = self.name {
            board.name = name;
        }
        if let Some(v) = self.temperature_celsius {
            board.temperature_celsius = v;
        }
        if let Some(v) = self.insulation_mohm {
            board.insulation_mohm = v;
        }
        if let Some(v) = self.impedance_ohm {
            board.impedance_ohm = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Instrument {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default)]
    pub calibration_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Defect {
    pub id: String,
    /// Present when the defect was taken from a library entry.
    #[serde(default)]
    pub library_id: Option<String>,
    #[serde(default)]
    pub location: String,
    /// Library description plus any freeform addendum, concatenated at save
    /// time. After a merge the contribution tag is part of this text.
    pub description: String,
    pub classification: Classification,
    #[serde(default)]
    pub action: String,
    /// At most two photo references; the capture flow enforces the cap.
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LibraryDefect {
    pub id: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    pub name: String,
    pub description: String,
    pub classification: Classification,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Measurements {
    #[serde(default)]
    pub grounding_system: String,
    #[serde(default)]
    pub main_fuse: String,
    #[serde(default)]
    pub voltage: String,
    #[serde(default)]
    pub construction_year: Option<i32>,
    #[serde(default)]
    pub has_energy_storage: bool,
    #[serde(default)]
    pub has_solar_system: bool,
    #[serde(default)]
    pub boards: Vec<Board>,
    #[serde(default)]
    pub selected_instruments: Vec<Instrument>,
}

impl Default for Measurements {
    fn default() -> Self {
        Measurements {
            grounding_system: String::new(),
            main_fuse: String::new(),
            voltage: String::new(),
            construction_year: None,
            has_energy_storage: false,
            has_solar_system: false,
            boards: Vec::new(),
            selected_instruments: Vec::new(),
        }
    }
}

impl Measurements {
    /// Fresh records start with one board so the form never opens empty.
    pub fn seeded() -> Self {
        Measurements {
            boards: vec![Board::placeholder(1)],
            ..Measurements::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeasurementsPatch {
    pub grounding_system: Option<String>,
    pub main_fuse: Option<String>,
    pub voltage: Option<String>,
    pub construction_year: Option<Option<i32>>,
    pub has_energy_storage: Option<bool>,
    pub has_solar_system: Option<bool>,
}

impl MeasurementsPatch {
    pub fn apply(self, measurements: &mut Measurements) {
        if let Some(v) = self.grounding_system {
            measurements.grounding_system = v;
        }
        if let Some(v) = self.main_fuse {
            measurements.main_fuse = v;
        }
        if let Some(v) = self.voltage {
            measurements.voltage = v;
        }
        if let Some(v) = self.construction_year {
            measurements.construction_year = v;
        }
        if let Some(v) = self.has_energy_storage {
            measurements.has_energy_storage = v;
        }
        if let Some(v) = self.has_solar_system {
            measurements.has_solar_system = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InspectionMeta {
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub client_address: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub project_address: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub inspector_name: String,
    #[serde(default)]
    pub scios_registration_number: String,
    /// Execution date of the inspection.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub inspection_interval_years: Option<u32>,
    /// Derived from `date` and `inspection_interval_years`; never set directly.
    #[serde(default)]
    pub next_inspection_date: Option<NaiveDate>,
    #[serde(default)]
    #[ts(type = "Record<string, boolean>")]
    pub usage_functions: BTreeMap<String, bool>,
    #[serde(default)]
    pub total_components: u32,
    /// Signature image as a data URL, captured by the shell.
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub is_contribution_mode: bool,
    /// Set exactly when `is_contribution_mode` is true.
    #[serde(default)]
    pub parent_inspection_id: Option<String>,
    #[serde(default)]
    pub parent_inspection_number: Option<String>,
    /// Remote identity once synced. Present means saves update, not insert.
    #[serde(default)]
    pub supabase_id: Option<String>,
    /// Append only, deduplicated by exact match, insertion order preserved.
    #[serde(default)]
    pub additional_inspectors: Vec<String>,
}

impl InspectionMeta {
    /// The contribution linkage invariant: a parent id is set exactly when
    /// the record is a contribution.
    pub fn linkage_consistent(&self) -> bool {
        self.is_contribution_mode == self.parent_inspection_id.is_some()
    }
}

/// Form-editable header fields. Contribution linkage, the remote id and the
/// co-inspector list are owned by the protocol and have no patch entry.
#[derive(Debug, Clone, Default)]
pub struct MetaPatch {
    pub client_name: Option<String>,
    pub client_address: Option<String>,
    pub project_name: Option<String>,
    pub project_address: Option<String>,
    pub company_name: Option<String>,
    pub inspector_name: Option<String>,
    pub scios_registration_number: Option<String>,
    pub date: Option<Option<NaiveDate>>,
    pub inspection_interval_years: Option<Option<u32>>,
    pub total_components: Option<u32>,
    pub signature: Option<Option<String>>,
}

impl MetaPatch {
    pub fn apply(self, meta: &mut InspectionMeta) {
        if let Some(v) = self.client_name {
            meta.client_name = v;
        }
        if let Some(v) = self.client_address {
            meta.client_address = v;
        }
        if let Some(v) = self.project_name {
            meta.project_name = v;
        }
        if let Some(v) = self.project_address {
            meta.project_address = v;
        }
        if let Some(v) = self.company_name {
            meta.company_name = v;
        }
        if let Some(v) = self.inspector_name {
            meta.inspector_name = v;
        }
        if let Some(v) = self.scios_registration_number {
            meta.scios_registration_number = v;
        }
        if let Some(v) = self.date {
            meta.date = v;
        }
        if let Some(v) = self.inspection_interval_years {
            meta.inspection_interval_years = v;
        }
        if let Some(v) = self.total_components {
            meta.total_components = v;
        }
        if let Some(v) = self.signature {
            meta.signature = v;
        }
    }
}

/// The full editable record of one inspection. The local store persists this
/// whole structure; the wire payload carries everything except the custom
/// library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InspectionState {
    pub meta: InspectionMeta,
    pub measurements: Measurements,
    #[serde(default)]
    pub defects: Vec<Defect>,
    #[serde(default)]
    pub custom_instruments: Vec<Instrument>,
    /// `None` means the built-in defect library is active.
    #[serde(default)]
    pub custom_library: Option<Vec<LibraryDefect>>,
}

impl Default for InspectionState {
    fn default() -> Self {
        InspectionState {
            meta: InspectionMeta::default(),
            measurements: Measurements::seeded(),
            defects: Vec::new(),
            custom_instruments: Vec::new(),
            custom_library: None,
        }
    }
}
