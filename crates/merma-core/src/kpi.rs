//! Headcount and rotation KPIs

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{CanonicalRecord, Period, Spell};

/// Headline numbers for the reporting month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kpis {
    /// Distinct class-1 employees on the active roster
    pub hc_activos_c1: usize,
    /// Class-1 RV/BXF separations inside the period
    pub bajas_mes: usize,
    /// bajas_mes / hc_activos_c1 × 100; `None` when the roster is empty
    pub rotacion_pct: Option<f64>,
    /// Headcount on the first day of the period
    pub hc_inicio: usize,
    /// Headcount on the day after the period ends
    pub hc_fin: usize,
    pub hc_promedio: f64,
}

/// Employees on the books at day `d`: hired on or before `d`, with no
/// separation date or one strictly after `d`
pub fn headcount_at(spells: &[Spell], d: NaiveDate) -> usize {
    spells
        .iter()
        .filter(|s| {
            s.fecha_ingreso.is_some_and(|ing| ing <= d)
                && s.fecha_baja.map_or(true, |baja| baja > d)
        })
        .count()
}

/// Records whose separation date falls inside the closed period
pub fn separations_in<'a>(
    records: &'a [CanonicalRecord],
    period: &Period,
) -> Vec<&'a CanonicalRecord> {
    records
        .iter()
        .filter(|r| {
            r.fecha_baja
                .is_some_and(|d| d >= period.start && d <= period.end)
        })
        .collect()
}

/// Compute the KPI bundle for the month.
///
/// `activos_c1` is the class-1 active roster, `bajas_mes` the month's class-1
/// RV/BXF separations (already filtered by the caller).
pub fn compute(spells: &[Spell], activos_c1: &[CanonicalRecord], bajas_mes: usize, period: &Period) -> Kpis {
    let hc_activos_c1 = activos_c1
        .iter()
        .map(|r| r.empleado.as_str())
        .collect::<HashSet<_>>()
        .len();

    let hc_inicio = headcount_at(spells, period.start);
    let hc_fin = headcount_at(spells, period.end + Duration::days(1));
    let hc_promedio = (hc_inicio + hc_fin) as f64 / 2.0;

    let rotacion_pct = if hc_activos_c1 > 0 {
        Some(bajas_mes as f64 / hc_activos_c1 as f64 * 100.0)
    } else {
        None
    };

    Kpis {
        hc_activos_c1,
        bajas_mes,
        rotacion_pct,
        hc_inicio,
        hc_fin,
        hc_promedio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn spell(id: &str, ingreso: Option<NaiveDate>, baja: Option<NaiveDate>) -> Spell {
        Spell {
            empleado: id.to_string(),
            fecha_ingreso: ingreso,
            fecha_baja: baja,
            clase: "1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_headcount_at_boundaries() {
        let spells = vec![
            spell("1", Some(d(2024, 1, 1)), None),
            spell("2", Some(d(2024, 4, 1)), Some(d(2024, 4, 15))),
            spell("3", Some(d(2024, 5, 1)), None),
            spell("4", None, None),
        ];

        // hired-on-day counts; gone from the separation day onward
        assert_eq!(headcount_at(&spells, d(2024, 4, 1)), 2);
        assert_eq!(headcount_at(&spells, d(2024, 4, 14)), 2);
        assert_eq!(headcount_at(&spells, d(2024, 4, 15)), 1);
        assert_eq!(headcount_at(&spells, d(2024, 5, 1)), 2);
    }

    #[test]
    fn test_separations_in_period_inclusive() {
        let period = Period {
            start: d(2024, 4, 1),
            end: d(2024, 4, 30),
        };
        let records = vec![
            spell("1", None, Some(d(2024, 3, 31))),
            spell("2", None, Some(d(2024, 4, 1))),
            spell("3", None, Some(d(2024, 4, 30))),
            spell("4", None, Some(d(2024, 5, 1))),
            spell("5", None, None),
        ];

        let inside = separations_in(&records, &period);
        let ids: Vec<&str> = inside.iter().map(|r| r.empleado.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn test_rotation_null_on_empty_roster() {
        let period = Period {
            start: d(2024, 4, 1),
            end: d(2024, 4, 30),
        };
        let kpis = compute(&[], &[], 3, &period);
        assert_eq!(kpis.rotacion_pct, None);
        assert_eq!(kpis.hc_activos_c1, 0);
    }

    #[test]
    fn test_rotation_percentage() {
        let period = Period {
            start: d(2024, 4, 1),
            end: d(2024, 4, 30),
        };
        let activos: Vec<CanonicalRecord> = (0..200)
            .map(|i| spell(&format!("{i}"), Some(d(2024, 1, 1)), None))
            .collect();
        let kpis = compute(&activos, &activos, 10, &period);
        assert_eq!(kpis.rotacion_pct, Some(5.0));
        assert_eq!(kpis.hc_inicio, 200);
        assert_eq!(kpis.hc_fin, 200);
        assert_eq!(kpis.hc_promedio, 200.0);
    }
}
