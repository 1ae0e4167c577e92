//! Grouped and cohort survival views

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{build_frame, km_curve, s_at, SurvivalObs};
use crate::models::Spell;
use crate::pareto::SIN_DATO;

/// Minimum members for a group or cohort to be reported at all
pub const MIN_GROUP_SIZE: usize = 5;

/// Survival checkpoints for one categorical group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSurvival {
    pub group: String,
    pub n: usize,
    #[serde(rename = "S(30)")]
    pub s30: f64,
    #[serde(rename = "S(60)")]
    pub s60: f64,
    #[serde(rename = "S(90)")]
    pub s90: f64,
    #[serde(rename = "S(180)")]
    pub s180: f64,
    #[serde(rename = "S(365)")]
    pub s365: f64,
}

/// Partition the survival frame by a categorical field and compute each
/// group's own curve.
///
/// Groups under [`MIN_GROUP_SIZE`] members are suppressed. The result is
/// sorted ascending by S(90) so the highest-risk groups lead.
pub fn survival_by<F>(frame: &[SurvivalObs], field: F) -> Vec<GroupSurvival>
where
    F: Fn(&SurvivalObs) -> Option<&str>,
{
    let mut groups: HashMap<String, Vec<SurvivalObs>> = HashMap::new();
    for obs in frame {
        let key = field(obs).unwrap_or(SIN_DATO).to_string();
        groups.entry(key).or_default().push(obs.clone());
    }

    let mut out: Vec<GroupSurvival> = groups
        .into_iter()
        .filter(|(_, members)| members.len() >= MIN_GROUP_SIZE)
        .map(|(group, members)| {
            let curve = km_curve(&members);
            GroupSurvival {
                group,
                n: members.len(),
                s30: s_at(&curve, 30),
                s60: s_at(&curve, 60),
                s90: s_at(&curve, 90),
                s180: s_at(&curve, 180),
                s365: s_at(&curve, 365),
            }
        })
        .collect();

    out.sort_by(|a, b| {
        a.s90
            .partial_cmp(&b.s90)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.group.cmp(&b.group))
    });
    out
}

/// 90-day retention for one hire cohort
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortSurvival {
    pub cohorte: String,
    pub n: usize,
    #[serde(rename = "S(90)")]
    pub s90: f64,
}

/// Partition the full spell population by hire year-month and compute each
/// cohort's own 90-day retention.
///
/// Works from spells (not the shared frame) because each cohort rebuilds its
/// own frame; cohorts under [`MIN_GROUP_SIZE`] are suppressed. Sorted
/// chronologically by cohort label.
pub fn hire_cohorts(spells: &[Spell], cutoff: NaiveDate) -> Vec<CohortSurvival> {
    let mut cohorts: HashMap<String, Vec<Spell>> = HashMap::new();
    for spell in spells {
        if let Some(ingreso) = spell.fecha_ingreso {
            let key = format!("{}-{:02}", ingreso.year(), ingreso.month());
            cohorts.entry(key).or_default().push(spell.clone());
        }
    }

    let mut out: Vec<CohortSurvival> = cohorts
        .into_iter()
        .filter(|(_, members)| members.len() >= MIN_GROUP_SIZE)
        .map(|(cohorte, members)| {
            let frame = build_frame(&members, cutoff);
            let curve = km_curve(&frame);
            CohortSurvival {
                cohorte,
                n: members.len(),
                s90: s_at(&curve, 90),
            }
        })
        .collect();

    out.sort_by(|a, b| a.cohorte.cmp(&b.cohorte));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(turno: &str, tiempo: i64, evento: bool) -> SurvivalObs {
        SurvivalObs {
            empleado: format!("{turno}-{tiempo}"),
            tiempo_dias: tiempo,
            evento,
            turno: Some(turno.to_string()),
            puesto: None,
        }
    }

    #[test]
    fn test_small_groups_suppressed() {
        let mut frame: Vec<SurvivalObs> = (0..5).map(|i| obs("A", 100 + i, false)).collect();
        frame.extend((0..4).map(|i| obs("B", 100 + i, false)));

        let groups = survival_by(&frame, |o| o.turno.as_deref());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group, "A");
        assert_eq!(groups[0].n, 5);
    }

    #[test]
    fn test_sorted_by_s90_ascending() {
        // shift A loses 3 of 5 by day 90, shift B only 1 of 5
        let mut frame = Vec::new();
        for i in 0..3 {
            frame.push(obs("A", 30 + i, true));
        }
        frame.push(obs("A", 400, false));
        frame.push(obs("A", 400, false));
        frame.push(obs("B", 30, true));
        for _ in 0..4 {
            frame.push(obs("B", 400, false));
        }

        let groups = survival_by(&frame, |o| o.turno.as_deref());
        assert_eq!(groups[0].group, "A");
        assert!(groups[0].s90 < groups[1].s90);
    }

    #[test]
    fn test_missing_field_buckets_as_sin_dato() {
        let mut frame: Vec<SurvivalObs> = (0..5).map(|i| obs("A", 100 + i, false)).collect();
        for o in frame.iter_mut() {
            o.turno = None;
        }
        let groups = survival_by(&frame, |o| o.turno.as_deref());
        assert_eq!(groups[0].group, SIN_DATO);
    }

    #[test]
    fn test_hire_cohorts_chronological() {
        fn spell(id: usize, ingreso: &str, baja: Option<&str>) -> Spell {
            let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
            Spell {
                empleado: id.to_string(),
                fecha_ingreso: Some(parse(ingreso)),
                fecha_baja: baja.map(parse),
                tipo_baja: baja.map(|_| "RV".to_string()),
                clase: "1".into(),
                ..Default::default()
            }
        }

        let mut spells = Vec::new();
        for i in 0..5 {
            spells.push(spell(i, "2024-02-01", None));
        }
        for i in 10..15 {
            spells.push(spell(i, "2024-01-01", Some("2024-02-15")));
        }
        // undersized March cohort disappears
        spells.push(spell(99, "2024-03-01", None));

        let cohorts = hire_cohorts(&spells, NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());
        assert_eq!(cohorts.len(), 2);
        assert_eq!(cohorts[0].cohorte, "2024-01");
        assert_eq!(cohorts[1].cohorte, "2024-02");
        // every January hire separated at day 45 -> S(90) = 0
        assert!(cohorts[0].s90 < 1e-9);
        assert!((cohorts[1].s90 - 1.0).abs() < 1e-9);
    }
}
