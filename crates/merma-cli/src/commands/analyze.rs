//! Analysis command implementation

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use merma_core::{
    import::read_csv_file, run_analysis, AiClient, AnalysisInputs, AnalysisOptions, AnalysisType,
    ReportData,
};

use super::corrections::open_store;

#[allow(clippy::too_many_arguments)]
pub async fn cmd_analyze(
    data_dir: Option<&Path>,
    activo: &Path,
    bajas: &Path,
    matriz: &Path,
    output: Option<&Path>,
    client: Option<String>,
    mes: Option<String>,
    cutoff: Option<&str>,
    no_ai: bool,
) -> Result<()> {
    let cutoff = cutoff
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("Invalid --cutoff date format (use YYYY-MM-DD)")?;

    println!("📥 Reading exports...");

    // The three extractions touch disjoint data; read them concurrently
    let (activo_rows, bajas_rows, matriz_rows) = {
        let (a, b, m) = (activo.to_path_buf(), bajas.to_path_buf(), matriz.to_path_buf());
        let (ra, rb, rm) = tokio::try_join!(
            tokio::task::spawn_blocking(move || read_csv_file(&a)),
            tokio::task::spawn_blocking(move || read_csv_file(&b)),
            tokio::task::spawn_blocking(move || read_csv_file(&m)),
        )
        .context("Row extraction task failed")?;
        (
            ra.context("Failed to read the active roster export")?,
            rb.context("Failed to read the separations export")?,
            rm.context("Failed to read the matrix export")?,
        )
    };
    println!(
        "   Activo: {} rows, Bajas: {} rows, Matriz: {} rows",
        activo_rows.len(),
        bajas_rows.len(),
        matriz_rows.len()
    );

    let store = open_store(data_dir);
    let corrections = store
        .load()
        .context("Failed to read corrections store")?;
    if !corrections.is_empty() {
        println!("   Using {} stored correction(s)", corrections.len());
    }

    let ai = if no_ai { None } else { AiClient::from_env() };
    if ai.is_none() && !no_ai {
        println!("💡 Tip: Set GEMINI_API_KEY to enable ML classification and the narrative summary");
    }

    let file_name = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let inputs = AnalysisInputs {
        activo: activo_rows,
        bajas: bajas_rows,
        matriz: matriz_rows,
    };
    let options = AnalysisOptions {
        file_names: vec![file_name(activo), file_name(bajas), file_name(matriz)],
        client_name: client,
        month_token: mes.map(|m| m.to_lowercase()),
        cutoff,
    };

    let report = run_analysis(&inputs, &corrections, ai.as_ref(), &options).await?;
    print_summary(&report);

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    match output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            println!();
            println!("✅ Full report written to {}", path.display());
        }
        None => {
            println!();
            println!("{}", json);
        }
    }

    Ok(())
}

fn print_summary(report: &ReportData) {
    println!();
    println!(
        "📊 {} — {} a {}",
        report.client_name,
        report.period.start.format("%d/%m/%Y"),
        report.period.end.format("%d/%m/%Y")
    );
    println!("   Bajas del mes (RV/BXF): {}", report.kpis.bajas_mes);
    println!("   Headcount activo C1: {}", report.kpis.hc_activos_c1);
    match report.kpis.rotacion_pct {
        Some(pct) => println!("   Rotación: {:.2}%", pct),
        None => println!("   Rotación: N/A (sin headcount activo)"),
    }
    println!(
        "   S90 global: {:.1}%",
        report.survival_metrics.s90 * 100.0
    );

    if report.trend.has_data {
        if let Some(stats) = &report.trend.stats {
            println!(
                "   Tendencia: {:+.2} bajas/mes (R² {:.2}) sobre {} meses",
                stats.slope, stats.r2, stats.periods
            );
        }
        for f in &report.trend.forecasts {
            println!("   Pronóstico {}: {:.1} bajas", f.ym, f.bajas.max(0.0));
        }
    } else {
        println!("   Tendencia: datos insuficientes (< 3 meses)");
    }

    if report.motivos.has_data {
        let method = match report.motivos.analysis_type {
            AnalysisType::Ml => "ML",
            AnalysisType::Keywords => "palabras clave",
        };
        println!("   Motivos ({}):", method);
        for bar in report.motivos.barras.iter().take(3) {
            println!("   - {} ({})", bar.category, bar.bajas);
        }
    } else {
        println!("   Motivos: sin columna de encuesta utilizable");
    }

    if report.ai_summary.is_none() {
        println!("   Resumen narrativo: no disponible");
    }
}
