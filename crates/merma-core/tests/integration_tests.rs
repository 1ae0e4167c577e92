//! Integration tests for merma-core
//!
//! These tests exercise the full import → reconcile → analyze workflow over
//! CSV exports, without touching the network (keyword/mock AI backends).

use chrono::NaiveDate;
use merma_core::{
    import::read_csv, run_analysis, AiClient, AnalysisInputs, AnalysisOptions, AnalysisType,
    Clasificacion, CorrectionsMap,
};

/// Active roster: two hire cohorts (12 × 2023-01, 10 × 2024-01) plus one
/// class-2 employee that every class-1 statistic must ignore.
fn activo_csv() -> String {
    let mut csv = String::from("Empleado,Nombre,Fecha Ingreso,Clase,Turno,Puesto,Area,Supervisor\n");
    for i in 1..=12 {
        csv.push_str(&format!(
            "{i},Empleado {i},2023-01-01,1,{},Operador,Ensamble,MARTINEZ\n",
            if i % 2 == 0 { "A" } else { "B" }
        ));
    }
    for i in 13..=22 {
        csv.push_str(&format!(
            "{i},Empleado {i},2024-01-01,1,{},Operador,Ensamble,RUIZ\n",
            if i % 2 == 0 { "A" } else { "B" }
        ));
    }
    csv.push_str("23,Empleado 23,2023-06-01,2,A,Supervisor,Ensamble,DIRECCION\n");
    csv
}

/// Separations across four distinct months so the trend fit engages:
/// 2023-04 (2), 2023-05 (1), 2024-03 (1), 2024-04 (3, the report month)
fn bajas_csv() -> &'static str {
    "Empleado,Fecha Baja,Tipo,Clase,Turno,Encuesta de Salida\n\
     1,2023-04-10,Renuncia Voluntaria,1,B,\n\
     2,2023-04-22,Renuncia Voluntaria,1,A,\n\
     3,2023-05-15,Renuncia Voluntaria,1,B,\n\
     13,2024-03-08,Baja por faltas consecutivas,1,B,\n\
     4,2024-04-05,Renuncia Voluntaria,1,A,mi supervisor me grita\n\
     5,2024-04-18,,1,B,me voy por mudanza a otra ciudad\n\
     14,2024-04-25,Baja por faltas,1,A,ok\n"
}

/// Matrix rows for the report month; employee 5's row supplies the missing
/// separation type for the keyed enrichment join
fn matriz_csv() -> &'static str {
    "Empleado,Fecha Baja,Tipo,Clase,Motivo Baja\n\
     4,2024-04-05,RV,1,renuncia voluntaria\n\
     5,2024-04-18,RV,1,cambio de residencia\n\
     14,2024-04-25,BXF,1,faltas\n"
}

fn inputs() -> AnalysisInputs {
    AnalysisInputs {
        activo: read_csv(activo_csv().as_bytes()).unwrap(),
        bajas: read_csv(bajas_csv().as_bytes()).unwrap(),
        matriz: read_csv(matriz_csv().as_bytes()).unwrap(),
    }
}

fn options() -> AnalysisOptions {
    AnalysisOptions {
        cutoff: NaiveDate::from_ymd_opt(2024, 8, 1),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_full_analysis_workflow() {
    let ai = AiClient::keyword();
    let report = run_analysis(&inputs(), &CorrectionsMap::new(), Some(&ai), &options())
        .await
        .unwrap();

    // period resolved from the newest separation date
    assert_eq!(report.period.start, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    assert_eq!(report.period.end, NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());

    // KPIs: 3 RV/BXF class-1 separations in April against 22 class-1 actives
    assert_eq!(report.kpis.bajas_mes, 3);
    assert_eq!(report.kpis.hc_activos_c1, 22);
    let rotacion = report.kpis.rotacion_pct.unwrap();
    assert!((rotacion - 3.0 / 22.0 * 100.0).abs() < 1e-9);

    // KM invariants: starts at (0, 1), non-increasing, S in [0, 1]
    assert_eq!(report.km_global[0].t_dias, 0);
    assert_eq!(report.km_global[0].s, 1.0);
    for window in report.km_global.windows(2) {
        assert!(window[1].s <= window[0].s);
        assert!((0.0..=1.0).contains(&window[1].s));
    }

    // Pareto invariants on every table
    for table in [
        &report.pareto.turno,
        &report.pareto.puesto,
        &report.pareto.area,
        &report.pareto.supervisor,
        &report.pareto.motivo_baja,
    ] {
        for window in table.windows(2) {
            assert!(window[0].bajas >= window[1].bajas);
            assert!(window[0].cumulative <= window[1].cumulative);
        }
        if let Some(last) = table.last() {
            assert!((last.cumulative - 100.0).abs() < 0.05);
        }
        for row in table.iter() {
            match row.classification {
                Clasificacion::Core80 => assert!(row.cumulative <= 80.01),
                Clasificacion::Cola20 => assert!(row.cumulative > 80.01),
            }
        }
    }

    // grouped survival: shifts A and B both have >= 5 members
    assert_eq!(report.surv_by_turno.len(), 2);
    for window in report.surv_by_turno.windows(2) {
        assert!(window[0].s90 <= window[1].s90);
    }

    // cohorts: chronological, class-2 hire never forms a cohort
    assert_eq!(report.cohorts.len(), 2);
    assert_eq!(report.cohorts[0].cohorte, "2023-01");
    assert_eq!(report.cohorts[0].n, 12);
    assert_eq!(report.cohorts[1].cohorte, "2024-01");
    assert_eq!(report.cohorts[1].n, 10);

    // trend over 4 distinct months, forecasting May and June 2024
    assert!(report.trend.has_data);
    assert_eq!(report.trend.historical.len(), 4);
    assert_eq!(report.trend.forecasts.len(), 2);
    assert_eq!(report.trend.forecasts[0].ym, "2024-05");
    assert_eq!(report.trend.forecasts[1].ym, "2024-06");

    // YoY: April 2024 (3) vs April 2023 (2) -> +50%; March 2024 has no prior
    let yoy_apr = report
        .historical_yoy
        .iter()
        .find(|p| p.ym == "2024-04")
        .unwrap();
    assert_eq!(yoy_apr.bajas_anio_previo, Some(2));
    assert!((yoy_apr.variacion_pct.unwrap() - 50.0).abs() < 1e-9);
    let yoy_mar = report
        .historical_yoy
        .iter()
        .find(|p| p.ym == "2024-03")
        .unwrap();
    assert_eq!(yoy_mar.variacion_pct, None);

    // motives: keyword path, the short "ok" comment excluded
    assert!(report.motivos.has_data);
    assert_eq!(report.motivos.analysis_type, AnalysisType::Keywords);
    let total: usize = report.motivos.barras.iter().map(|b| b.bajas).sum();
    assert_eq!(total, 2);
    assert!(report
        .motivos
        .barras
        .iter()
        .any(|b| b.category == "Problemas con el supervisor"));
    assert!(report
        .motivos
        .barras
        .iter()
        .any(|b| b.category == "Cambio de residencia / ciudad"));

    // the keyword backend cannot write narratives; the rest still reports
    assert!(report.ai_summary.is_none());
}

#[tokio::test]
async fn test_enrichment_recovers_untyped_separation() {
    // employee 5's Bajas row has a blank type; the Matriz join supplies RV,
    // so the April separation count includes it
    let ai = AiClient::keyword();
    let report = run_analysis(&inputs(), &CorrectionsMap::new(), Some(&ai), &options())
        .await
        .unwrap();
    assert_eq!(report.kpis.bajas_mes, 3);
}

#[tokio::test]
async fn test_corrections_override_end_to_end() {
    let ai = AiClient::mock();
    let mut corrections = CorrectionsMap::new();
    corrections.insert(
        "mi supervisor me grita".into(),
        "Ambiente laboral".into(),
    );

    let report = run_analysis(&inputs(), &corrections, Some(&ai), &options())
        .await
        .unwrap();

    assert!(report
        .motivos
        .barras
        .iter()
        .any(|b| b.category == "Ambiente laboral"));
    assert!(!report
        .motivos
        .barras
        .iter()
        .any(|b| b.category == "Problemas con el supervisor"));
    // the corrected category also feeds the motive Pareto
    assert!(report
        .pareto
        .motivo_baja
        .iter()
        .any(|r| r.value == "Ambiente laboral"));
}

#[tokio::test]
async fn test_spell_uniqueness() {
    // run twice over the same inputs: derived tables are pure functions of
    // the inputs, so the reports must match
    let ai = AiClient::keyword();
    let a = run_analysis(&inputs(), &CorrectionsMap::new(), Some(&ai), &options())
        .await
        .unwrap();
    let b = run_analysis(&inputs(), &CorrectionsMap::new(), Some(&ai), &options())
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}
