//! Record reconciliation across the three exports
//!
//! The separations export (Bajas) is authoritative for dates but frequently
//! ships with blank categorical columns; the reconciliation matrix (Matriz)
//! has the categories but unreliable dates. Enrichment backfills Bajas from
//! Matriz with Bajas winning on conflict, then canonicalizes the separation
//! type. Spell assembly unifies Active and Bajas into one tenure record per
//! employee.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{CanonicalRecord, Spell, TipoBaja};

/// Columns eligible for Matriz → Bajas backfill
const BACKFILL_COLUMNS: usize = 7;

/// Merge `src` into `dst`, filling only fields `dst` is missing.
///
/// Precedence rule: the destination (Bajas) wins; the source (Matriz) only
/// supplies what is absent. Kept as an explicit function so the precedence is
/// testable in isolation.
pub fn backfill_missing(dst: &mut CanonicalRecord, src: &CanonicalRecord) {
    let fields: [(&mut Option<String>, &Option<String>); BACKFILL_COLUMNS] = [
        (&mut dst.tipo_baja, &src.tipo_baja),
        (&mut dst.motivo_baja, &src.motivo_baja),
        (&mut dst.turno, &src.turno),
        (&mut dst.puesto, &src.puesto),
        (&mut dst.area, &src.area),
        (&mut dst.supervisor, &src.supervisor),
        (&mut dst.nombre, &src.nombre),
    ];
    for (dst_field, src_field) in fields {
        if dst_field.as_deref().map_or(true, |s| s.trim().is_empty()) {
            if let Some(v) = src_field {
                *dst_field = Some(v.clone());
            }
        }
    }
}

fn join_key(rec: &CanonicalRecord) -> Option<String> {
    let baja = rec.fecha_baja?;
    if rec.empleado.is_empty() {
        return None;
    }
    Some(format!("{}_{}", rec.empleado, baja.format("%Y-%m-%d")))
}

/// Enrich the Bajas set from Matriz and canonicalize `tipo_baja`.
///
/// The join is on `(empleado, fecha_baja)`; rows without a parseable
/// separation date are left untouched apart from type canonicalization.
pub fn enrich_bajas(bajas: &[CanonicalRecord], matriz: &[CanonicalRecord]) -> Vec<CanonicalRecord> {
    let mut matriz_by_key: HashMap<String, &CanonicalRecord> = HashMap::new();
    for rec in matriz {
        if let Some(key) = join_key(rec) {
            matriz_by_key.insert(key, rec);
        }
    }

    let mut enriched: Vec<CanonicalRecord> = bajas
        .iter()
        .map(|rec| {
            let mut out = rec.clone();
            if let Some(key) = join_key(rec) {
                if let Some(mat) = matriz_by_key.get(&key) {
                    backfill_missing(&mut out, mat);
                }
            }
            out.tipo_baja = Some(out.tipo().as_str().to_string());
            out
        })
        .collect();

    apply_matriz_type_fallback(&mut enriched, matriz);
    enriched
}

/// Cross-source type inference: when no Bajas row came out typed RV/BXF but
/// Matriz carries typed rows, map employee → type from Matriz (first
/// occurrence wins) and retype Bajas rows still marked OTRO.
fn apply_matriz_type_fallback(enriched: &mut [CanonicalRecord], matriz: &[CanonicalRecord]) {
    let has_typed = enriched.iter().any(|r| r.tipo().is_attrition());
    let matriz_has_tipo = matriz.iter().any(|r| r.tipo_baja.is_some());
    if has_typed || !matriz_has_tipo {
        return;
    }

    let mut by_employee: HashMap<&str, TipoBaja> = HashMap::new();
    for rec in matriz {
        let tipo = rec.tipo();
        if tipo.is_attrition() && !rec.empleado.is_empty() {
            by_employee.entry(rec.empleado.as_str()).or_insert(tipo);
        }
    }
    if by_employee.is_empty() {
        return;
    }

    let mut retyped = 0usize;
    for rec in enriched.iter_mut() {
        if !rec.tipo().is_attrition() {
            if let Some(tipo) = by_employee.get(rec.empleado.as_str()) {
                rec.tipo_baja = Some(tipo.as_str().to_string());
                retyped += 1;
            }
        }
    }
    debug!(retyped, "Applied Matriz separation-type fallback");
}

/// Merge two records for the month's pareto source: start from `base`
/// (Matriz) and overwrite with everything `over` (Bajas) carries
pub fn merge_records(base: &CanonicalRecord, over: &CanonicalRecord) -> CanonicalRecord {
    let mut merged = base.clone();
    merged.empleado = over.empleado.clone();
    overlay(&mut merged, over);
    merged
}

/// Overlay `src`'s present fields onto `dst` (used when a separation record
/// lands on an active-roster spell)
fn overlay(dst: &mut CanonicalRecord, src: &CanonicalRecord) {
    if src.nombre.is_some() {
        dst.nombre = src.nombre.clone();
    }
    if src.fecha_ingreso.is_some() {
        dst.fecha_ingreso = src.fecha_ingreso;
    }
    if src.fecha_baja.is_some() {
        dst.fecha_baja = src.fecha_baja;
    }
    dst.clase = src.clase.clone();
    if src.turno.is_some() {
        dst.turno = src.turno.clone();
    }
    if src.puesto.is_some() {
        dst.puesto = src.puesto.clone();
    }
    if src.area.is_some() {
        dst.area = src.area.clone();
    }
    if src.supervisor.is_some() {
        dst.supervisor = src.supervisor.clone();
    }
    if src.tipo_baja.is_some() {
        dst.tipo_baja = src.tipo_baja.clone();
    }
    if src.motivo_baja.is_some() {
        dst.motivo_baja = src.motivo_baja.clone();
    }
    for (k, v) in &src.extra {
        dst.extra.insert(k.clone(), v.clone());
    }
}

/// Assemble the unified spell set: one record per employee id observed in
/// either source. Active rows seed the map; separation rows overlay them,
/// but a spell is never overwritten once it has a separation date.
pub fn build_spells(activos: &[CanonicalRecord], bajas: &[CanonicalRecord]) -> Vec<Spell> {
    let mut order: Vec<String> = Vec::new();
    let mut by_id: HashMap<String, Spell> = HashMap::new();

    for rec in activos {
        if !by_id.contains_key(&rec.empleado) {
            order.push(rec.empleado.clone());
        }
        by_id.insert(rec.empleado.clone(), rec.clone());
    }

    for rec in bajas {
        match by_id.get_mut(&rec.empleado) {
            Some(existing) => {
                if existing.fecha_baja.is_none() {
                    overlay(existing, rec);
                }
            }
            None => {
                order.push(rec.empleado.clone());
                by_id.insert(rec.empleado.clone(), rec.clone());
            }
        }
    }

    order
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn baja(id: &str, fecha: Option<NaiveDate>, tipo: Option<&str>) -> CanonicalRecord {
        CanonicalRecord {
            empleado: id.to_string(),
            fecha_baja: fecha,
            tipo_baja: tipo.map(String::from),
            clase: "1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_backfill_precedence_bajas_wins() {
        let mut dst = CanonicalRecord {
            turno: Some("A".into()),
            puesto: None,
            ..Default::default()
        };
        let src = CanonicalRecord {
            turno: Some("B".into()),
            puesto: Some("Operador".into()),
            supervisor: Some("MARTINEZ".into()),
            ..Default::default()
        };

        backfill_missing(&mut dst, &src);
        // existing value kept, gaps filled
        assert_eq!(dst.turno.as_deref(), Some("A"));
        assert_eq!(dst.puesto.as_deref(), Some("Operador"));
        assert_eq!(dst.supervisor.as_deref(), Some("MARTINEZ"));
    }

    #[test]
    fn test_enrich_joins_on_empleado_and_date() {
        let bajas = vec![baja("100", Some(d(2024, 4, 15)), None)];
        let mut mat = baja("100", Some(d(2024, 4, 15)), Some("RENUNCIA VOLUNTARIA"));
        mat.motivo_baja = Some("mejor oferta".into());
        let other = baja("100", Some(d(2024, 3, 1)), Some("BXF"));

        let enriched = enrich_bajas(&bajas, &[other, mat]);
        assert_eq!(enriched[0].tipo_baja.as_deref(), Some("RV"));
        assert_eq!(enriched[0].motivo_baja.as_deref(), Some("mejor oferta"));
    }

    #[test]
    fn test_enrich_canonicalizes_even_without_match() {
        let bajas = vec![baja("1", Some(d(2024, 4, 2)), Some("baja por faltas"))];
        let enriched = enrich_bajas(&bajas, &[]);
        assert_eq!(enriched[0].tipo_baja.as_deref(), Some("BXF"));
    }

    #[test]
    fn test_matriz_type_fallback_applies_when_bajas_untyped() {
        let bajas = vec![
            baja("100", Some(d(2024, 4, 15)), None),
            baja("101", Some(d(2024, 4, 20)), None),
        ];
        // Matriz rows carry types but on different dates, so the keyed join
        // misses and only the employee-level fallback can recover them
        let matriz = vec![
            baja("100", Some(d(2024, 4, 16)), Some("RV")),
            baja("100", Some(d(2024, 2, 1)), Some("BXF")),
            baja("101", Some(d(2024, 4, 21)), Some("BXF")),
        ];

        let enriched = enrich_bajas(&bajas, &matriz);
        // first occurrence wins for employee 100
        assert_eq!(enriched[0].tipo_baja.as_deref(), Some("RV"));
        assert_eq!(enriched[1].tipo_baja.as_deref(), Some("BXF"));
    }

    #[test]
    fn test_matriz_type_fallback_skipped_when_bajas_typed() {
        let bajas = vec![
            baja("100", Some(d(2024, 4, 15)), Some("RV")),
            baja("101", Some(d(2024, 4, 20)), None),
        ];
        let matriz = vec![baja("101", Some(d(2024, 1, 1)), Some("BXF"))];

        let enriched = enrich_bajas(&bajas, &matriz);
        // one typed Bajas row disables the fallback entirely
        assert_eq!(enriched[1].tipo_baja.as_deref(), Some("OTRO"));
    }

    #[test]
    fn test_spells_one_per_employee() {
        let activos = vec![
            CanonicalRecord {
                empleado: "100".into(),
                fecha_ingreso: Some(d(2024, 1, 1)),
                clase: "1".into(),
                ..Default::default()
            },
            CanonicalRecord {
                empleado: "101".into(),
                fecha_ingreso: Some(d(2024, 2, 1)),
                clase: "1".into(),
                ..Default::default()
            },
        ];
        let bajas = vec![
            baja("100", Some(d(2024, 4, 15)), Some("RV")),
            baja("200", Some(d(2024, 4, 10)), Some("BXF")),
        ];

        let spells = build_spells(&activos, &bajas);
        assert_eq!(spells.len(), 3);
        let s100 = spells.iter().find(|s| s.empleado == "100").unwrap();
        // hire date survives the overlay, separation date lands
        assert_eq!(s100.fecha_ingreso, Some(d(2024, 1, 1)));
        assert_eq!(s100.fecha_baja, Some(d(2024, 4, 15)));
    }

    #[test]
    fn test_spell_with_separation_never_overwritten() {
        let activos = vec![baja("100", Some(d(2024, 3, 1)), Some("RV"))];
        let bajas = vec![baja("100", Some(d(2024, 4, 15)), Some("BXF"))];

        let spells = build_spells(&activos, &bajas);
        assert_eq!(spells.len(), 1);
        assert_eq!(spells[0].fecha_baja, Some(d(2024, 3, 1)));
        assert_eq!(spells[0].tipo_baja.as_deref(), Some("RV"));
    }
}
