//! Reporting-period resolution
//!
//! The month a report covers comes, in order of preference, from a Spanish
//! month token in the matrix export's filename, from the newest separation
//! date observed in the data, or from the current month. All calendar math is
//! in the UTC day grid; there is no DST handling anywhere in the engine.

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::models::{CanonicalRecord, Period};

const SPANISH_MONTHS: &[(&str, u32)] = &[
    ("enero", 1),
    ("febrero", 2),
    ("marzo", 3),
    ("abril", 4),
    ("mayo", 5),
    ("junio", 6),
    ("julio", 7),
    ("agosto", 8),
    ("septiembre", 9),
    ("setiembre", 9),
    ("octubre", 10),
    ("noviembre", 11),
    ("diciembre", 12),
];

/// Parse a Spanish month name ("Enero" ... "Diciembre", "setiembre" accepted)
pub fn month_name_to_num(token: &str) -> Option<u32> {
    let t = token.trim().to_lowercase();
    SPANISH_MONTHS
        .iter()
        .find(|(name, _)| *name == t)
        .map(|(_, n)| *n)
}

/// Client name and month token recovered from the export filenames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameInfo {
    pub client_name: String,
    pub month_token: Option<String>,
}

fn clean_file_name(name: &str) -> String {
    let mut clean = name.to_lowercase();
    // strip "(1)"-style copy markers browsers add to re-downloads
    while let (Some(open), Some(close)) = (clean.find('('), clean.find(')')) {
        if open < close && clean[open + 1..close].chars().all(|c| c.is_ascii_digit()) {
            clean.replace_range(open..=close, "");
        } else {
            break;
        }
    }
    for suffix in [".xlsx", ".xls", ".csv"] {
        if let Some(stripped) = clean.strip_suffix(suffix) {
            clean = stripped.to_string();
            break;
        }
    }
    clean.trim().to_string()
}

/// Recover the client name (and, from the matrix file, the month token) out
/// of the conventional `activo_<cliente>` / `bajas_<cliente>` /
/// `matrizrotacion_<cliente>_<mes>` filenames.
pub fn parse_file_names(names: &[&str]) -> FileNameInfo {
    let mut client = String::from("Cliente");
    let mut month_token = None;

    for name in names {
        let clean = clean_file_name(name);
        if let Some(rest) = clean.strip_prefix("activo_") {
            client = rest.to_string();
        } else if let Some(rest) = clean.strip_prefix("bajas_") {
            client = rest.to_string();
        } else if let Some(rest) = clean.strip_prefix("matrizrotacion_") {
            let parts: Vec<&str> = rest.split('_').collect();
            if parts.len() >= 2 {
                if client == "Cliente" {
                    client = parts[0].to_string();
                }
                month_token = Some(parts[parts.len() - 1].to_string());
            }
        }
    }

    let mut chars = client.chars();
    let client_name = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::from("Cliente"),
    };
    FileNameInfo {
        client_name,
        month_token,
    }
}

/// Last calendar day of a month
pub fn month_last_day(year: i32, month: u32) -> NaiveDate {
    let (next_y, next_m) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_y, next_m, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 28).unwrap())
}

/// Resolve the closed month interval the report covers.
///
/// Resolution order: an explicit Spanish month token (resolved against the
/// current year), else the month of the newest separation date across the
/// enriched Bajas and Matriz sets, else the current month.
pub fn resolve_period(
    month_token: Option<&str>,
    bajas: &[CanonicalRecord],
    matriz: &[CanonicalRecord],
    today: NaiveDate,
) -> Period {
    let mut year = today.year();
    let mut month = month_token.and_then(month_name_to_num);

    if month.is_none() {
        let max_baja = bajas
            .iter()
            .chain(matriz.iter())
            .filter_map(|r| r.fecha_baja)
            .max();
        match max_baja {
            Some(d) => {
                month = Some(d.month());
                year = d.year();
            }
            None => month = Some(today.month()),
        }
    }

    let month = month.unwrap_or_else(|| today.month());
    let period = Period {
        start: NaiveDate::from_ymd_opt(year, month, 1)
            .unwrap_or_else(|| today.with_day(1).unwrap()),
        end: month_last_day(year, month),
    };
    debug!(start = %period.start, end = %period.end, "Resolved reporting period");
    period
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn baja_on(date: NaiveDate) -> CanonicalRecord {
        CanonicalRecord {
            empleado: "1".into(),
            fecha_baja: Some(date),
            clase: "1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_month_name_to_num() {
        assert_eq!(month_name_to_num("Enero"), Some(1));
        assert_eq!(month_name_to_num(" ABRIL "), Some(4));
        assert_eq!(month_name_to_num("setiembre"), Some(9));
        assert_eq!(month_name_to_num("septiembre"), Some(9));
        assert_eq!(month_name_to_num("january"), None);
    }

    #[test]
    fn test_parse_file_names() {
        let info = parse_file_names(&[
            "Activo_Norte (1).xlsx",
            "Bajas_norte.xlsx",
            "MatrizRotacion_norte_Abril.xlsx",
        ]);
        assert_eq!(info.client_name, "Norte");
        assert_eq!(info.month_token.as_deref(), Some("abril"));
    }

    #[test]
    fn test_parse_file_names_defaults() {
        let info = parse_file_names(&["roster.csv", "leavers.csv", "matrix.csv"]);
        assert_eq!(info.client_name, "Cliente");
        assert_eq!(info.month_token, None);
    }

    #[test]
    fn test_resolve_period_from_token_uses_current_year() {
        let p = resolve_period(Some("abril"), &[], &[], d(2024, 8, 7));
        assert_eq!(p.start, d(2024, 4, 1));
        assert_eq!(p.end, d(2024, 4, 30));
    }

    #[test]
    fn test_resolve_period_from_max_fecha_baja() {
        let bajas = vec![baja_on(d(2023, 11, 3)), baja_on(d(2023, 12, 28))];
        let matriz = vec![baja_on(d(2023, 10, 9))];
        let p = resolve_period(None, &bajas, &matriz, d(2024, 8, 7));
        assert_eq!(p.start, d(2023, 12, 1));
        assert_eq!(p.end, d(2023, 12, 31));
    }

    #[test]
    fn test_resolve_period_falls_back_to_current_month() {
        let p = resolve_period(None, &[], &[], d(2024, 2, 10));
        assert_eq!(p.start, d(2024, 2, 1));
        assert_eq!(p.end, d(2024, 2, 29));
    }

    #[test]
    fn test_month_last_day_december() {
        assert_eq!(month_last_day(2024, 12), d(2024, 12, 31));
    }
}
