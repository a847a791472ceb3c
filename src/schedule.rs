use chrono::{Datelike, NaiveDate};

use crate::model::InspectionMeta;

/// Execution date plus the interval in years, with calendar correction:
/// Feb 29 becomes Feb 28 when the target year is not a leap year.
pub fn next_inspection_date(date: NaiveDate, interval_years: u32) -> NaiveDate {
    let target_year = date.year() + interval_years as i32;
    match NaiveDate::from_ymd_opt(target_year, date.month(), date.day()) {
        Some(rolled) => rolled,
        None => NaiveDate::from_ymd_opt(target_year, 2, 28).unwrap_or(date),
    }
}

/// Recompute the derived field. Runs synchronously after every mutation of
/// either input, so readers never observe a stale value.
pub fn recompute(meta: &mut InspectionMeta) {
    meta.next_inspection_date = match (meta.date, meta.inspection_interval_years) {
        (Some(date), Some(years)) => Some(next_inspection_date(date, years)),
        _ => None,
    };
}
