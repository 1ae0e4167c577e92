//! CSV import for the three workforce exports
//!
//! The engine itself works on lists of [`RawRecord`]s; this module is the
//! concrete row source for CSV files. Blank cells become JSON `null` so the
//! downstream normalizer sees the same shape a spreadsheet reader with
//! `defval = null` would produce.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::RawRecord;

/// Read a CSV export into raw row records.
///
/// A failure here is structural (unreadable source) and aborts the run; it is
/// the only fatal error class in the pipeline.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut records = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let mut row = RawRecord::new();
        for (i, header) in headers.iter().enumerate() {
            let value = match record.get(i) {
                Some(cell) if !cell.trim().is_empty() => Value::String(cell.to_string()),
                _ => Value::Null,
            };
            row.insert(header.to_string(), value);
        }
        records.push(row);
    }

    debug!("Read {} rows", records.len());
    Ok(records)
}

/// Read a CSV export from disk
pub fn read_csv_file(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path)
        .map_err(|e| Error::Import(format!("Unable to open {}: {}", path.display(), e)))?;
    read_csv(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_blank_cells_become_null() {
        let csv = "Empleado,Nombre,Fecha Baja\n100,Ana Lopez,2024-04-15\n101,,\n";

        let rows = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Empleado"], Value::String("100".into()));
        assert_eq!(rows[1]["Nombre"], Value::Null);
        assert_eq!(rows[1]["Fecha Baja"], Value::Null);
    }

    #[test]
    fn test_read_csv_flexible_rows() {
        // Trailing columns missing from a row read as null, not an error
        let csv = "a,b,c\n1,2,3\n4,5\n";

        let rows = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["c"], Value::Null);
    }

    #[test]
    fn test_read_csv_file_missing_is_import_error() {
        let err = read_csv_file(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, Error::Import(_)));
    }
}
