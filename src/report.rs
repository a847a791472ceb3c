use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Defect, InspectionMeta};
use crate::sample_size::{self, SampleBand};

/// Matches the attribution tag a merge prepends to defect descriptions.
/// Case-insensitive and tolerant of a missing trailing colon; older records
/// exist in both forms.
static ATTRIBUTION_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*\[BIJDRAGE\s+[^\]]*\]:?\s*").expect("attribution pattern compiles")
});

/// Defect text as the report presents it: the stored description keeps the
/// attribution tag, the rendered description drops it.
pub fn display_description(defect: &Defect) -> String {
    ATTRIBUTION_TAG
        .replace(&defect.description, "")
        .into_owned()
}

/// The "executed by" line: main inspector first, then co-inspectors in the
/// order they were merged in, comma-joined, exact duplicates dropped.
pub fn executed_by(meta: &InspectionMeta) -> String {
    let mut names: Vec<&str> = Vec::new();
    let main = meta.inspector_name.trim();
    if !main.is_empty() {
        names.push(main);
    }
    for extra in &meta.additional_inspectors {
        let name = extra.trim();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names.join(", ")
}

/// Sampling hint for the current record.
pub fn required_sample(meta: &InspectionMeta) -> SampleBand {
    sample_size::sample_size_row(meta.total_components)
}

/// The full sampling table for the report appendix.
pub fn sample_table() -> Vec<SampleBand> {
    sample_size::sample_bands()
}

/// Defects ordered for presentation: most severe first, stable within one
/// severity so merge order is preserved.
pub fn presentation_order(defects: &[Defect]) -> Vec<&Defect> {
    let mut ordered: Vec<&Defect> = defects.iter().collect();
    ordered.sort_by(|a, b| b.classification.cmp(&a.classification));
    ordered
}
