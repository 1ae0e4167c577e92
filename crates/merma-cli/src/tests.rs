//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::fs;

use tempfile::tempdir;

use crate::commands;

#[test]
fn test_cli_parses() {
    use clap::CommandFactory;
    crate::cli::Cli::command().debug_assert();
}

// ========== Corrections Command Tests ==========

#[test]
fn test_cmd_corrections_round_trip() {
    let dir = tempdir().unwrap();
    let store = commands::open_store(Some(dir.path()));

    // empty list works
    assert!(commands::cmd_corrections_list(&store).is_ok());

    // add, list, remove
    let result =
        commands::cmd_corrections_add(&store, "no me gusto el turno de noche", "Horarios / Turnos");
    assert!(result.is_ok());
    assert!(commands::cmd_corrections_list(&store).is_ok());

    let map = store.load().unwrap();
    assert_eq!(
        map.get("no me gusto el turno de noche").map(String::as_str),
        Some("Horarios / Turnos")
    );

    assert!(commands::cmd_corrections_remove(&store, "no me gusto el turno de noche").is_ok());
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn test_cmd_corrections_add_rejects_unknown_category() {
    let dir = tempdir().unwrap();
    let store = commands::open_store(Some(dir.path()));

    let result = commands::cmd_corrections_add(&store, "algun comentario", "Categoria Inventada");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Valid categories"));
}

#[test]
fn test_cmd_corrections_path() {
    let dir = tempdir().unwrap();
    let store = commands::open_store(Some(dir.path()));
    assert!(commands::cmd_corrections_path(&store).is_ok());
    assert!(store.path().ends_with("corrections.json"));
}

// ========== Analyze Command Tests ==========

#[tokio::test]
async fn test_cmd_analyze_writes_report() {
    let dir = tempdir().unwrap();

    let activo = dir.path().join("Activo_Norte.csv");
    fs::write(
        &activo,
        "Empleado,Nombre,Fecha Ingreso,Clase,Turno\n\
         1,Ana,2024-01-01,1,A\n\
         2,Luis,2024-01-01,1,B\n\
         3,Eva,2024-02-01,1,A\n",
    )
    .unwrap();

    let bajas = dir.path().join("Bajas_Norte.csv");
    fs::write(
        &bajas,
        "Empleado,Fecha Baja,Tipo,Clase\n\
         1,2024-04-10,Renuncia Voluntaria,1\n",
    )
    .unwrap();

    let matriz = dir.path().join("MatrizRotacion_norte_Abril.csv");
    fs::write(&matriz, "Empleado,Fecha Baja,Tipo,Clase\n").unwrap();

    let output = dir.path().join("report.json");
    let result = commands::cmd_analyze(
        Some(dir.path()),
        &activo,
        &bajas,
        &matriz,
        Some(&output),
        None,
        None,
        Some("2024-08-01"),
        true, // --no-ai: keyword classification, no summary
    )
    .await;
    assert!(result.is_ok());
    assert!(output.exists());

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["client_name"], "Norte");
    assert_eq!(report["kpis"]["bajas_mes"], 1);
    assert_eq!(report["period"]["start"], "2024-04-01");
    assert!(report["ai_summary"].is_null());
}

#[tokio::test]
async fn test_cmd_analyze_missing_file_fails() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.csv");

    let result = commands::cmd_analyze(
        Some(dir.path()),
        &missing,
        &missing,
        &missing,
        None,
        None,
        None,
        None,
        true,
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cmd_analyze_invalid_cutoff() {
    let dir = tempdir().unwrap();
    let any = dir.path().join("x.csv");

    let result = commands::cmd_analyze(
        Some(dir.path()),
        &any,
        &any,
        &any,
        None,
        None,
        None,
        Some("not-a-date"),
        true,
    )
    .await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("--cutoff"));
}
