use serde::Serialize;
use ts_rs::TS;

/// One row of the sampling table: populations up to and including `upper`
/// require `size` inspected items. A `size` of `None` means the population
/// itself (every item is inspected).
struct Step {
    upper: u32,
    size: Option<u32>,
    label: &'static str,
}

/// Single source for both the numeric lookup and the labelled report table,
/// so the two can never drift apart.
const STEPS: &[Step] = &[
    Step { upper: 5, size: None, label: "1 t/m 5" },
    Step { upper: 25, size: Some(5), label: "6 t/m 25" },
    Step { upper: 50, size: Some(8), label: "26 t/m 50" },
    Step { upper: 90, size: Some(13), label: "51 t/m 90" },
    Step { upper: 150, size: Some(20), label: "91 t/m 150" },
    Step { upper: 280, size: Some(32), label: "151 t/m 280" },
    Step { upper: 500, size: Some(50), label: "281 t/m 500" },
    Step { upper: 1200, size: Some(80), label: "501 t/m 1200" },
    Step { upper: 3200, size: Some(125), label: "1201 t/m 3200" },
    Step { upper: 10000, size: Some(200), label: "3201 t/m 10000" },
];

const OVERFLOW_SIZE: u32 = 315;
const OVERFLOW_LABEL: &str = "meer dan 10000";

/// Required sample size for a component population.
pub fn sample_size(total_population: u32) -> u32 {
    if total_population == 0 {
        return 0;
    }
    for step in STEPS {
        if total_population <= step.upper {
            return step.size.unwrap_or(total_population);
        }
    }
    OVERFLOW_SIZE
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SampleBand {
    pub population_label: String,
    pub sample_size: u32,
}

/// The sample size together with the population-range label the report
/// renders next to it.
pub fn sample_size_row(total_population: u32) -> SampleBand {
    if total_population == 0 {
        return SampleBand {
            population_label: "0".to_string(),
            sample_size: 0,
        };
    }
    for step in STEPS {
        if total_population <= step.upper {
            return SampleBand {
                population_label: step.label.to_string(),
                sample_size: step.size.unwrap_or(total_population),
            };
        }
    }
    SampleBand {
        population_label: OVERFLOW_LABEL.to_string(),
        sample_size: OVERFLOW_SIZE,
    }
}

/// All bands of the table, for the report appendix. Where the sample equals
/// the population the band reports the range upper bound.
pub fn sample_bands() -> Vec<SampleBand> {
    let mut rows: Vec<SampleBand> = STEPS
        .iter()
        .map(|step| SampleBand {
            population_label: step.label.to_string(),
            sample_size: step.size.unwrap_or(step.upper),
        })
        .collect();
    rows.push(SampleBand {
        population_label: OVERFLOW_LABEL.to_string(),
        sample_size: OVERFLOW_SIZE,
    });
    rows
}
