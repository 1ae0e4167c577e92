//! Schema normalization for heterogeneous spreadsheet exports
//!
//! Every client ships the same three exports with different column headers
//! ("Empleado #", "No. Empleado", "ID EMPLEADO", ...). This module folds
//! headers into a fixed canonical vocabulary so the rest of the engine never
//! sees source-specific names.
//!
//! The alias mapping is decided once per batch, from the first record's
//! headers; unmatched columns pass through under their normalized name.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::debug;

use crate::models::{CanonicalRecord, RawRecord, SourceKind};

/// Ordered alias candidates per canonical field. The first alias found among
/// the (normalized) headers of the first record fixes the mapping for the
/// whole batch.
const ALIAS_CANDIDATES: &[(&str, &[&str])] = &[
    (
        "empleado",
        &[
            "empleado",
            "empleado_",
            "empleado_#",
            "empleado#",
            "id_empleado",
            "no_empleado",
            "identificador",
            "num_empleado",
            "numero_empleado",
            "employee_id",
        ],
    ),
    (
        "nombre",
        &[
            "nombre",
            "nombre_empleado",
            "empleado_nombre",
            "nombre_completo",
            "employee_name",
            "name",
            "nombre_trabajador",
        ],
    ),
    (
        "fecha_ingreso",
        &[
            "fecha_ingreso",
            "fecha_de_ingreso",
            "fecha_contratacion",
            "fecha_de_alta",
            "f_alta",
            "alta",
            "fecha_alta",
            "fecha_de_alta_en_el_sistema",
        ],
    ),
    (
        "fecha_baja",
        &[
            "fecha_baja",
            "fecha_de_baja",
            "fecha_de_baja_en_el_sistema",
            "fecha_ultimo_dia",
            "fecha_de_ultimo_dia_de_trabajo_udt",
            "f_baja",
            "fecha_evento_baja",
            "baja",
        ],
    ),
    (
        "clase",
        &[
            "clase",
            "clase_personal",
            "clase_de_personal",
            "categoria",
            "class",
            "clasificacion",
            "clasificacion_personal",
            "grupo",
            "nivel",
        ],
    ),
    ("turno", &["turno", "shift"]),
    ("puesto", &["puesto", "posicion", "position", "job_title", "cargo"]),
    ("area", &["area", "departamento", "depto", "dept", "area_depto"]),
    ("supervisor", &["supervisor", "jefe", "lider", "lead", "manager"]),
    (
        "tipo_baja",
        &[
            "tipo_baja",
            "tipo_de_baja_en_el_sistema",
            "clasificacion_baja",
            "tipo",
            "causa_baja_tipo",
        ],
    ),
    (
        "motivo_baja",
        &[
            "motivo_baja",
            "razon_de_renuncia",
            "motivo",
            "causa_baja",
            "razon_baja",
            "razon_capturada_en_sistema",
        ],
    ),
];

/// Strip Spanish diacritics (á→a ... ñ→n), preserving everything else
pub fn fold_diacritics(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            'Á' | 'À' | 'Â' | 'Ä' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'Ó' | 'Ò' | 'Ô' | 'Ö' => 'O',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'Ñ' => 'N',
            _ => c,
        })
        .collect()
}

/// Normalize a column header: trim, lower-case, fold diacritics, collapse
/// non-alphanumeric runs to a single underscore, trim edge underscores
pub fn normalize_header(header: &str) -> String {
    let folded = fold_diacritics(header.trim()).to_lowercase();
    let mut out = String::with_capacity(folded.len());
    let mut pending_sep = false;
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Build the header → canonical-field mapping from the first record.
/// Returns normalized-header keys.
fn column_mapping(first: &RawRecord) -> HashMap<String, &'static str> {
    let headers: Vec<String> = first.keys().map(|k| normalize_header(k)).collect();
    let mut mapping = HashMap::new();
    for (canon, aliases) in ALIAS_CANDIDATES {
        for alias in *aliases {
            if headers.iter().any(|h| h == alias) {
                mapping.insert((*alias).to_string(), *canon);
                break;
            }
        }
    }
    mapping
}

/// Render a scalar cell as trimmed text; `None` for null/blank
fn text_of(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Spreadsheet serial-date epoch (the 1900 system, Lotus leap-year bug
/// included)
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Parse any scalar into a date: numbers are spreadsheet serials, strings are
/// tried against the common export formats. Unparsable values become `None`.
pub fn robust_parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Number(n) => {
            let serial = n.as_f64()?;
            if !serial.is_finite() {
                return None;
            }
            let epoch = NaiveDate::from_ymd_opt(EXCEL_EPOCH.0, EXCEL_EPOCH.1, EXCEL_EPOCH.2)?;
            epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
        }
        Value::String(s) => parse_date_text(s),
        _ => None,
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // ISO datetime variants first (spreadsheet readers emit these)
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%d/%m/%Y", // 15/01/2024 (European)
        "%m/%d/%y", // 01/15/24
        "%m-%d-%Y", // 01-15-2024
    ];
    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    None
}

/// Whether a class code designates class-1 (direct labor) personnel
pub fn is_class1(clase: &str) -> bool {
    let s = clase.trim().to_uppercase();
    if ["1", "01", "CLASE 1", "CLASE1"].contains(&s.as_str()) {
        return true;
    }
    match s.parse::<f64>() {
        Ok(n) if n.is_finite() => n.trunc() == 1.0,
        _ => false,
    }
}

/// Canonicalize a batch of raw rows from one export.
///
/// Applies header normalization and the first-record alias mapping, then
/// fixes the two structural gaps the exports are known to have: a missing id
/// column (synthesized `temp_<source>_<row>` ids) and a missing class column
/// (every row defaults to "1").
pub fn canonicalize(records: &[RawRecord], source: SourceKind) -> Vec<CanonicalRecord> {
    let Some(first) = records.first() else {
        return Vec::new();
    };
    let mapping = column_mapping(first);
    let has_empleado = mapping.values().any(|c| *c == "empleado");
    let has_clase = mapping.values().any(|c| *c == "clase");

    let out: Vec<CanonicalRecord> = records
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let mut rec = CanonicalRecord {
                clase: "1".to_string(),
                ..Default::default()
            };
            for (key, value) in raw {
                let norm = normalize_header(key);
                match mapping.get(&norm).copied() {
                    Some("empleado") => rec.empleado = text_of(value).unwrap_or_default(),
                    Some("nombre") => rec.nombre = text_of(value),
                    Some("fecha_ingreso") => rec.fecha_ingreso = robust_parse_date(value),
                    Some("fecha_baja") => rec.fecha_baja = robust_parse_date(value),
                    Some("clase") => {
                        rec.clase = text_of(value).unwrap_or_else(|| "1".to_string())
                    }
                    Some("turno") => rec.turno = text_of(value),
                    Some("puesto") => rec.puesto = text_of(value),
                    Some("area") => rec.area = text_of(value),
                    Some("supervisor") => rec.supervisor = text_of(value),
                    Some("tipo_baja") => rec.tipo_baja = text_of(value),
                    Some("motivo_baja") => rec.motivo_baja = text_of(value),
                    _ => {
                        if !norm.is_empty() && !value.is_null() {
                            rec.extra.insert(norm, value.clone());
                        }
                    }
                }
            }
            if !has_empleado {
                rec.empleado = format!("temp_{}_{}", source, i + 1);
            }
            if !has_clase {
                rec.clase = "1".to_string();
            }
            rec
        })
        .collect();

    debug!(
        source = %source,
        rows = out.len(),
        mapped = mapping.len(),
        "Canonicalized export"
    );
    out
}
