//! Pareto concentration tables
//!
//! Frequency tables over a categorical column, sorted by descending count,
//! with cumulative percentage and a Core 80 / Cola 20 split used to surface
//! the "vital few" values driving attrition.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Cumulative-percentage cutoff for the Core 80 classification. The extra
/// 0.01 absorbs 2-decimal rounding at the 80% boundary.
pub const CORE80_CUTOFF: f64 = 80.01;

/// Sentinel bucket for null/blank values
pub const SIN_DATO: &str = "SIN DATO";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Clasificacion {
    #[serde(rename = "Core 80")]
    Core80,
    #[serde(rename = "Cola 20")]
    Cola20,
}

/// One row of a Pareto table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParetoRecord {
    pub value: String,
    pub bajas: usize,
    /// Share of the total, rounded to 2 decimals
    pub percentage: f64,
    /// Running sum of the rounded percentages
    pub cumulative: f64,
    pub classification: Clasificacion,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Build a Pareto table over a categorical series.
///
/// `None` and blank values collapse into the [`SIN_DATO`] bucket. Ties in
/// count break alphabetically so the table is deterministic.
pub fn pareto_table<I>(values: I) -> Vec<ParetoRecord>
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut total = 0usize;
    for value in values {
        total += 1;
        let key = match value {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => SIN_DATO.to_string(),
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    if total == 0 {
        return Vec::new();
    }

    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut cumulative = 0.0;
    entries
        .into_iter()
        .map(|(value, bajas)| {
            let percentage = round2(bajas as f64 / total as f64 * 100.0);
            cumulative = round2(cumulative + percentage);
            ParetoRecord {
                value,
                bajas,
                percentage,
                cumulative,
                classification: if cumulative <= CORE80_CUTOFF {
                    Clasificacion::Core80
                } else {
                    Clasificacion::Cola20
                },
            }
        })
        .collect()
}
