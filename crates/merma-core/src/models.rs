//! Domain models for merma

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One spreadsheet row as delivered by the row source: arbitrary column
/// headers mapped to scalar values, with `null` for absent cells.
pub type RawRecord = serde_json::Map<String, Value>;

/// Which of the three input exports a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Active roster export
    Activo,
    /// Separations export
    Bajas,
    /// Rotation reconciliation matrix
    Matriz,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activo => "act",
            Self::Bajas => "baj",
            Self::Matriz => "mat",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical separation type bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TipoBaja {
    /// Voluntary resignation
    #[serde(rename = "RV")]
    Rv,
    /// Absence-based termination
    #[serde(rename = "BXF")]
    Bxf,
    /// Everything else
    #[serde(rename = "OTRO")]
    Otro,
}

impl TipoBaja {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rv => "RV",
            Self::Bxf => "BXF",
            Self::Otro => "OTRO",
        }
    }

    /// Canonicalize a free-text separation type.
    ///
    /// Case-insensitive, periods stripped. "RENUNCIA" anywhere or an exact
    /// "RV" is a voluntary resignation; "FALTA"/"CONSECUTIV" anywhere or an
    /// exact "BXF" is an absence-based termination. Idempotent on its own
    /// output.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let s = raw.unwrap_or("").trim().to_uppercase().replace('.', "");
        if s.contains("RENUNCIA") || s == "RV" {
            Self::Rv
        } else if s.contains("FALTA") || s == "BXF" || s.contains("CONSECUTIV") {
            Self::Bxf
        } else {
            Self::Otro
        }
    }

    /// RV and BXF count as attrition events; OTRO is administrative noise.
    pub fn is_attrition(&self) -> bool {
        matches!(self, Self::Rv | Self::Bxf)
    }
}

impl std::fmt::Display for TipoBaja {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A row remapped onto the canonical field vocabulary.
///
/// Unmapped columns are retained verbatim (normalized header names) in
/// `extra`. Dates that failed parsing are `None`, never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Employee id; synthesized `temp_<source>_<n>` when the export has no
    /// id column
    pub empleado: String,
    pub nombre: Option<String>,
    pub fecha_ingreso: Option<NaiveDate>,
    pub fecha_baja: Option<NaiveDate>,
    /// Personnel class code, defaults to "1"
    pub clase: String,
    pub turno: Option<String>,
    pub puesto: Option<String>,
    pub area: Option<String>,
    pub supervisor: Option<String>,
    /// Raw separation type text; replaced with the canonical code during
    /// reconciliation
    pub tipo_baja: Option<String>,
    pub motivo_baja: Option<String>,
    /// Unmapped columns, keyed by normalized header
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl CanonicalRecord {
    /// Canonical separation type for this record
    pub fn tipo(&self) -> TipoBaja {
        TipoBaja::from_raw(self.tipo_baja.as_deref())
    }

    /// Look up a column by normalized name, canonical fields included.
    /// Returns the trimmed text value, or `None` for blank/absent cells.
    pub fn text_value(&self, column: &str) -> Option<String> {
        let direct = match column {
            "empleado" => Some(self.empleado.clone()),
            "nombre" => self.nombre.clone(),
            "clase" => Some(self.clase.clone()),
            "turno" => self.turno.clone(),
            "puesto" => self.puesto.clone(),
            "area" => self.area.clone(),
            "supervisor" => self.supervisor.clone(),
            "tipo_baja" => self.tipo_baja.clone(),
            "motivo_baja" => self.motivo_baja.clone(),
            _ => match self.extra.get(column) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                Some(Value::Bool(b)) => Some(b.to_string()),
                _ => None,
            },
        };
        direct
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Column names present on this record (canonical fields that carry a
    /// value, plus all extras)
    pub fn column_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for (name, present) in [
            ("empleado", !self.empleado.is_empty()),
            ("nombre", self.nombre.is_some()),
            ("fecha_ingreso", self.fecha_ingreso.is_some()),
            ("fecha_baja", self.fecha_baja.is_some()),
            ("clase", !self.clase.is_empty()),
            ("turno", self.turno.is_some()),
            ("puesto", self.puesto.is_some()),
            ("area", self.area.is_some()),
            ("supervisor", self.supervisor.is_some()),
            ("tipo_baja", self.tipo_baja.is_some()),
            ("motivo_baja", self.motivo_baja.is_some()),
        ] {
            if present {
                names.push(name.to_string());
            }
        }
        names.extend(self.extra.keys().cloned());
        names
    }
}

/// One employee's tenure interval, from hire to separation or censoring.
///
/// Built by merging an active-roster record with a separation record for the
/// same employee id; at most one spell per employee within an analysis.
pub type Spell = CanonicalRecord;

/// Closed calendar-month interval the report covers (UTC, no DST)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// First calendar day of the month
    pub start: NaiveDate,
    /// Last calendar day of the month
    pub end: NaiveDate,
}
