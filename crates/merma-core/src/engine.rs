//! Analysis pipeline orchestration
//!
//! Normalize → reconcile → resolve period → {KPI/Pareto, survival, trend} →
//! categorize motives → narrative summary. All statistics are synchronous
//! and deterministic; only the two external AI calls suspend, and each one
//! is guarded so its failure degrades the report instead of aborting it.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::ai::{AiBackend, AiClient};
use crate::corrections::CorrectionsMap;
use crate::kpi;
use crate::models::{CanonicalRecord, RawRecord, SourceKind};
use crate::motivos::{self, AnalysisType, MotivosData};
use crate::pareto::pareto_table;
use crate::period::{parse_file_names, resolve_period};
use crate::reconcile::{build_spells, enrich_bajas, merge_records};
use crate::report::{ParetoTables, ReportData};
use crate::schema::{canonicalize, is_class1};
use crate::survival::{
    build_frame, hire_cohorts, km_conditional_month, km_curve, summarize, survival_by,
};
use crate::trend;
use crate::Result;

/// The three raw row sets, as delivered by the row source
#[derive(Debug, Clone, Default)]
pub struct AnalysisInputs {
    pub activo: Vec<RawRecord>,
    pub bajas: Vec<RawRecord>,
    pub matriz: Vec<RawRecord>,
}

/// Run options
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Source filenames, used to recover the client name and month token
    pub file_names: Vec<String>,
    /// Explicit client name, overrides filename detection
    pub client_name: Option<String>,
    /// Explicit Spanish month token, overrides filename detection
    pub month_token: Option<String>,
    /// Censoring cutoff ("now"); defaults to the current UTC date
    pub cutoff: Option<NaiveDate>,
}

/// Classify with the configured backend, falling back to the local keyword
/// classifier on any deviation (no backend, error, or count mismatch).
async fn classify_with_fallback(
    ai: Option<&AiClient>,
    comments: &[String],
    corrections: &CorrectionsMap,
) -> (Vec<String>, AnalysisType) {
    if let Some(client) = ai {
        match client.classify_motives(comments, corrections).await {
            Ok(categories) if categories.len() == comments.len() => {
                return (categories, client.analysis_type());
            }
            Ok(categories) => warn!(
                got = categories.len(),
                expected = comments.len(),
                "Classifier returned a mismatched count, using keyword fallback"
            ),
            Err(e) => warn!(error = %e, "Remote classification failed, using keyword fallback"),
        }
    }
    let categories = comments
        .iter()
        .map(|c| motivos::assign_closed_set(c).to_string())
        .collect();
    (categories, AnalysisType::Keywords)
}

/// Run the full attrition analysis over the three inputs.
///
/// Always returns a best-effort report: degraded sections carry their
/// `has_data` / `analysis_type` flags and the summary is `None` on failure.
/// Only an unreadable row source (upstream of this call) is fatal.
pub async fn run_analysis(
    inputs: &AnalysisInputs,
    corrections: &CorrectionsMap,
    ai: Option<&AiClient>,
    options: &AnalysisOptions,
) -> Result<ReportData> {
    // 1) Normalization
    let act = canonicalize(&inputs.activo, SourceKind::Activo);
    let baj = canonicalize(&inputs.bajas, SourceKind::Bajas);
    let mat = canonicalize(&inputs.matriz, SourceKind::Matriz);

    // 2) Reconciliation
    let baj_enriched = enrich_bajas(&baj, &mat);

    // 3) Period resolution
    let names: Vec<&str> = options.file_names.iter().map(String::as_str).collect();
    let info = parse_file_names(&names);
    let client_name = options
        .client_name
        .clone()
        .unwrap_or(info.client_name);
    let month_token = options.month_token.clone().or(info.month_token);
    let cutoff = options.cutoff.unwrap_or_else(|| Utc::now().date_naive());
    let period = resolve_period(month_token.as_deref(), &baj_enriched, &mat, cutoff);

    // 4) Class-1 filtering and spell assembly
    let act_c1: Vec<CanonicalRecord> = act
        .iter()
        .filter(|r| is_class1(&r.clase))
        .cloned()
        .collect();
    let baj_c1_all: Vec<CanonicalRecord> = baj_enriched
        .iter()
        .filter(|r| is_class1(&r.clase))
        .cloned()
        .collect();
    let baj_c1: Vec<CanonicalRecord> = baj_c1_all
        .iter()
        .filter(|r| r.tipo().is_attrition())
        .cloned()
        .collect();
    let mat_c1: Vec<CanonicalRecord> = mat
        .iter()
        .filter(|r| is_class1(&r.clase) && r.tipo().is_attrition())
        .cloned()
        .collect();
    let spells = build_spells(&act_c1, &baj_c1);

    // 5) KPIs
    let bajas_mes = kpi::separations_in(&baj_c1, &period);
    let kpis = kpi::compute(&spells, &act_c1, bajas_mes.len(), &period);
    info!(
        bajas_mes = kpis.bajas_mes,
        hc_activos = kpis.hc_activos_c1,
        "Computed monthly KPIs"
    );

    // 6) Month pareto source: id-union of Bajas and Matriz rows, Bajas wins
    let mat_mes = kpi::separations_in(&mat_c1, &period);
    let baj_by_id: HashMap<&str, &CanonicalRecord> = bajas_mes
        .iter()
        .filter(|r| !r.empleado.is_empty())
        .map(|r| (r.empleado.as_str(), *r))
        .collect();
    let mat_by_id: HashMap<&str, &CanonicalRecord> = mat_mes
        .iter()
        .filter(|r| !r.empleado.is_empty())
        .map(|r| (r.empleado.as_str(), *r))
        .collect();
    let mut ids: Vec<&str> = Vec::new();
    for r in bajas_mes.iter().chain(mat_mes.iter()) {
        if !r.empleado.is_empty() && !ids.contains(&r.empleado.as_str()) {
            ids.push(r.empleado.as_str());
        }
    }
    let pareto_source: Vec<CanonicalRecord> = ids
        .iter()
        .map(|id| match (mat_by_id.get(id), baj_by_id.get(id)) {
            (Some(m), Some(b)) => merge_records(m, b),
            (None, Some(b)) => (*b).clone(),
            (Some(m), None) => (*m).clone(),
            (None, None) => unreachable!("id came from one of the maps"),
        })
        .collect();

    let mut pareto = ParetoTables {
        turno: pareto_table(pareto_source.iter().map(|r| r.turno.clone())),
        puesto: pareto_table(pareto_source.iter().map(|r| r.puesto.clone())),
        area: pareto_table(pareto_source.iter().map(|r| r.area.clone())),
        supervisor: pareto_table(pareto_source.iter().map(|r| r.supervisor.clone())),
        motivo_baja: Vec::new(),
    };

    // 7) Survival analysis
    let frame = build_frame(&spells, cutoff);
    let km_global = km_curve(&frame);
    let km_cond = km_conditional_month(&spells, &bajas_mes, &period);
    let survival_metrics = summarize(&frame, &km_global, &km_cond);
    let surv_by_turno = survival_by(&frame, |o| o.turno.as_deref());
    let surv_by_puesto = survival_by(&frame, |o| o.puesto.as_deref());
    let cohorts = hire_cohorts(&spells, cutoff);

    // 8) Trend and year-over-year
    let trend_analysis = trend::analyze(&baj_c1_all);
    let historical_yoy = trend::year_over_year(&trend_analysis.historical);

    // 9) Motive categorization
    let mut motivos_data = MotivosData::empty();
    if let Some(text_col) = motivos::detect_text_col(&pareto_source) {
        motivos_data.text_col = Some(text_col.clone());
        let eligible: Vec<&CanonicalRecord> = pareto_source
            .iter()
            .filter(|r| {
                r.text_value(&text_col)
                    .is_some_and(|t| motivos::is_eligible(&t))
            })
            .collect();
        let comments: Vec<String> = eligible
            .iter()
            .filter_map(|r| r.text_value(&text_col))
            .collect();

        if !comments.is_empty() {
            let (categories, analysis_type) =
                classify_with_fallback(ai, &comments, corrections).await;
            let finals = motivos::apply_corrections(&comments, &categories, corrections);
            motivos_data = motivos::aggregate(
                &eligible,
                &comments,
                &finals,
                &spells,
                &text_col,
                analysis_type,
            );
            pareto.motivo_baja = pareto_table(finals.into_iter().map(Some));
        }
    }
    // raw-column fallback when the survey yielded nothing
    if pareto.motivo_baja.is_empty() {
        pareto.motivo_baja = pareto_table(pareto_source.iter().map(|r| r.motivo_baja.clone()));
    }

    // 10) Assembly and narrative summary
    let mut report = ReportData {
        client_name,
        period,
        kpis,
        pareto,
        km_global,
        survival_metrics,
        km_cond,
        surv_by_turno,
        surv_by_puesto,
        cohorts,
        trend: trend_analysis,
        motivos: motivos_data,
        historical_yoy,
        ai_summary: None,
    };

    if let Some(client) = ai {
        match client.narrative_summary(&report.digest()).await {
            Ok(summary) => report.ai_summary = Some(summary),
            Err(e) => {
                warn!(error = %e, "Narrative summary unavailable, continuing without it");
            }
        }
    } else {
        debug!("No AI backend configured, skipping narrative summary");
    }

    Ok(report)
}
