//! Kaplan-Meier estimator
//!
//! Non-parametric step-function estimate of the probability of remaining
//! employed past t days. Censored observations contribute to the risk set
//! without being deaths.

use serde::{Deserialize, Serialize};

use super::SurvivalObs;

/// One step of a survival curve. The curve is right-continuous: the value at
/// day d is the S of the last point with `t_dias <= d`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KmPoint {
    pub t_dias: i64,
    #[serde(rename = "S")]
    pub s: f64,
}

/// Kaplan-Meier curve over a frame of censored observations.
///
/// Walks the distinct event durations in ascending order; at each one,
/// `S ← S × (1 − deaths/at_risk)` where the risk set counts every
/// observation (censored included) with duration ≥ t. Always starts at
/// `(0, 1.0)`.
pub fn km_curve(frame: &[SurvivalObs]) -> Vec<KmPoint> {
    let mut event_times: Vec<i64> = frame
        .iter()
        .filter(|o| o.evento)
        .map(|o| o.tiempo_dias)
        .collect();
    event_times.sort_unstable();
    event_times.dedup();

    let mut s = 1.0;
    let mut curve = vec![KmPoint { t_dias: 0, s: 1.0 }];

    for t in event_times {
        let at_risk = frame.iter().filter(|o| o.tiempo_dias >= t).count();
        if at_risk == 0 {
            continue;
        }
        let deaths = frame
            .iter()
            .filter(|o| o.evento && o.tiempo_dias == t)
            .count();
        s *= 1.0 - deaths as f64 / at_risk as f64;
        curve.push(KmPoint { t_dias: t, s });
    }
    curve
}

/// Survival probability at `day`: the S of the last point at or before it,
/// 1.0 when the curve has not stepped yet
pub fn s_at(curve: &[KmPoint], day: i64) -> f64 {
    curve
        .iter()
        .take_while(|p| p.t_dias <= day)
        .last()
        .map_or(1.0, |p| p.s)
}

/// Conditional probability of an event in `(t1, t2]` given survival to `t1`.
/// `None` when nobody is at risk at `t1`.
pub fn hazard_bin(frame: &[SurvivalObs], t1: i64, t2: i64) -> Option<f64> {
    let at_risk = frame.iter().filter(|o| o.tiempo_dias >= t1).count();
    if at_risk == 0 {
        return None;
    }
    let events = frame
        .iter()
        .filter(|o| o.evento && o.tiempo_dias > t1 && o.tiempo_dias <= t2)
        .count();
    Some(events as f64 / at_risk as f64)
}
