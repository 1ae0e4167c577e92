//! Survival analysis over employee tenure
//!
//! Builds a censored observation frame from the spell set and derives four
//! views from it:
//!
//! - the global Kaplan-Meier curve ([`km::km_curve`])
//! - the conditional month-of curve ([`conditional::km_conditional_month`])
//! - per-group curves for shift and position ([`groups::survival_by`])
//! - hire-cohort retention ([`groups::hire_cohorts`])
//!
//! A spell counts as an event only when it ended in an RV/BXF separation;
//! everything else is right-censored at the analysis cutoff.

pub mod conditional;
pub mod groups;
pub mod km;

pub use conditional::{km_conditional_month, KmConditionalPoint};
pub use groups::{hire_cohorts, survival_by, CohortSurvival, GroupSurvival};
pub use km::{hazard_bin, km_curve, s_at, KmPoint};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Spell;

/// One censored tenure observation
#[derive(Debug, Clone)]
pub struct SurvivalObs {
    pub empleado: String,
    /// Whole days from hire to separation or cutoff
    pub tiempo_dias: i64,
    /// true when the spell ended in an RV/BXF separation
    pub evento: bool,
    pub turno: Option<String>,
    pub puesto: Option<String>,
}

/// Build the survival frame from spells.
///
/// Spells with no hire date or a negative duration are discarded, not
/// corrected. The cutoff is the end of observation for spells still open.
pub fn build_frame(spells: &[Spell], cutoff: NaiveDate) -> Vec<SurvivalObs> {
    let mut dropped = 0usize;
    let frame: Vec<SurvivalObs> = spells
        .iter()
        .filter_map(|s| {
            let Some(ingreso) = s.fecha_ingreso else {
                dropped += 1;
                return None;
            };
            let evento = s.fecha_baja.is_some() && s.tipo().is_attrition();
            let fin = s.fecha_baja.unwrap_or(cutoff);
            let tiempo_dias = (fin - ingreso).num_days();
            if tiempo_dias < 0 {
                dropped += 1;
                return None;
            }
            Some(SurvivalObs {
                empleado: s.empleado.clone(),
                tiempo_dias,
                evento,
                turno: s.turno.clone(),
                puesto: s.puesto.clone(),
            })
        })
        .collect();

    if dropped > 0 {
        debug!(dropped, kept = frame.len(), "Dropped spells from survival frame");
    }
    frame
}

/// Summary bundle reported alongside the curves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurvivalMetrics {
    pub s30: f64,
    pub s60: f64,
    pub s90: f64,
    pub s180: f64,
    pub s365: f64,
    /// Smallest t with S ≤ 0.5, `None` if the curve never drops that far
    pub mediana: Option<i64>,
    pub haz_0_30: Option<f64>,
    pub haz_31_60: Option<f64>,
    pub haz_61_90: Option<f64>,
    /// Survival at the end of the conditional month curve
    pub s_end_cond: f64,
    /// 1 − s_end_cond: probability of separating during the month given
    /// presence at its start
    pub hazard_cond_mes: f64,
}

/// Assemble the metrics bundle from the global curve, the frame, and the
/// conditional month curve.
pub fn summarize(
    frame: &[SurvivalObs],
    km_global: &[KmPoint],
    km_cond: &[KmConditionalPoint],
) -> SurvivalMetrics {
    let mediana = km_global
        .iter()
        .find(|p| p.s <= 0.5)
        .map(|p| p.t_dias);
    let s_end_cond = km_cond.last().map_or(1.0, |p| p.s);

    SurvivalMetrics {
        s30: s_at(km_global, 30),
        s60: s_at(km_global, 60),
        s90: s_at(km_global, 90),
        s180: s_at(km_global, 180),
        s365: s_at(km_global, 365),
        mediana,
        haz_0_30: hazard_bin(frame, 0, 30),
        haz_31_60: hazard_bin(frame, 30, 60),
        haz_61_90: hazard_bin(frame, 60, 90),
        s_end_cond,
        hazard_cond_mes: 1.0 - s_end_cond,
    }
}
