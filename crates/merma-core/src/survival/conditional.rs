//! Conditional month-of survival
//!
//! Restricted to the cohort already on the books when the month opens, this
//! walks the month day by day and decrements the risk set with the month's
//! separation list, matched by employee id. The risk set is NOT re-derived
//! from tenure durations; the id-matched walk is the contract.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{CanonicalRecord, Period, Spell};

/// One day of the conditional curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KmConditionalPoint {
    pub fecha: NaiveDate,
    #[serde(rename = "S")]
    pub s: f64,
    pub at_risk: usize,
    pub events: usize,
}

/// Conditional survival across the reporting month.
///
/// The at-risk cohort is every spell hired on or before the period start and
/// not yet separated by it. Returns an empty curve when the cohort is empty;
/// otherwise the first row sits one day before the period start at S = 1.
pub fn km_conditional_month(
    spells: &[Spell],
    month_separations: &[&CanonicalRecord],
    period: &Period,
) -> Vec<KmConditionalPoint> {
    let at_risk: Vec<&Spell> = spells
        .iter()
        .filter(|s| {
            s.fecha_ingreso.is_some_and(|ing| ing <= period.start)
                && s.fecha_baja.map_or(true, |baja| baja > period.start)
        })
        .collect();
    if at_risk.is_empty() {
        return Vec::new();
    }

    // separation date per employee; later rows win like the source list
    let mut event_dates: HashMap<&str, NaiveDate> = HashMap::new();
    for rec in month_separations {
        if let Some(d) = rec.fecha_baja {
            event_dates.insert(rec.empleado.as_str(), d);
        }
    }

    // events per day, restricted to the at-risk cohort and the period
    let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
    for spell in &at_risk {
        if let Some(d) = event_dates.get(spell.empleado.as_str()) {
            if *d >= period.start && *d <= period.end {
                *per_day.entry(*d).or_insert(0) += 1;
            }
        }
    }

    let mut n = at_risk.len();
    let mut s = 1.0;
    let mut rows = vec![KmConditionalPoint {
        fecha: period.start - Duration::days(1),
        s: 1.0,
        at_risk: n,
        events: 0,
    }];

    let mut day = period.start;
    while day <= period.end {
        let e = per_day.get(&day).copied().unwrap_or(0);
        if n > 0 && e > 0 {
            s *= 1.0 - e as f64 / n as f64;
            n -= e.min(n);
        }
        rows.push(KmConditionalPoint {
            fecha: day,
            s,
            at_risk: n,
            events: e,
        });
        day += Duration::days(1);
    }
    rows
}
