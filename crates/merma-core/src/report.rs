//! The assembled report document
//!
//! [`ReportData`] is the sole contract consumed by presentation and export
//! collaborators: everything the dashboard, spreadsheet export, and summary
//! renderers need is in here, and nothing else leaves the engine.

use serde::{Deserialize, Serialize};

use crate::ai::AiSummary;
use crate::kpi::Kpis;
use crate::models::Period;
use crate::motivos::MotivosData;
use crate::pareto::ParetoRecord;
use crate::survival::{
    CohortSurvival, GroupSurvival, KmConditionalPoint, KmPoint, SurvivalMetrics,
};
use crate::trend::{TrendAnalysis, YoYPoint};

/// The five Pareto tables of the report. `motivo_baja` is rebuilt from the
/// final text categories when the survey column yields anything; otherwise
/// it falls back to the raw column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParetoTables {
    pub turno: Vec<ParetoRecord>,
    pub puesto: Vec<ParetoRecord>,
    pub area: Vec<ParetoRecord>,
    pub supervisor: Vec<ParetoRecord>,
    pub motivo_baja: Vec<ParetoRecord>,
}

/// Full monthly attrition report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub client_name: String,
    pub period: Period,
    pub kpis: Kpis,
    pub pareto: ParetoTables,
    pub km_global: Vec<KmPoint>,
    pub survival_metrics: SurvivalMetrics,
    pub km_cond: Vec<KmConditionalPoint>,
    pub surv_by_turno: Vec<GroupSurvival>,
    pub surv_by_puesto: Vec<GroupSurvival>,
    pub cohorts: Vec<CohortSurvival>,
    pub trend: TrendAnalysis,
    pub motivos: MotivosData,
    pub historical_yoy: Vec<YoYPoint>,
    pub ai_summary: Option<AiSummary>,
}

impl ReportData {
    /// Plain key-value digest handed to the narrative-summary collaborator.
    ///
    /// Three sections: overall situation, root cause (where/why), retention
    /// (when). Numbers only; no interpretation.
    pub fn digest(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "Análisis de Rotación de Personal para {}\n",
            self.client_name
        ));
        out.push_str(&format!(
            "Periodo: {} - {}\n\n",
            self.period.start.format("%d/%m/%Y"),
            self.period.end.format("%d/%m/%Y")
        ));

        out.push_str("**1. Situación General (KPIs):**\n");
        out.push_str(&format!(
            "- Rotación Mensual: {}\n",
            self.kpis
                .rotacion_pct
                .map_or("N/A".to_string(), |p| format!("{p:.2}%"))
        ));
        out.push_str(&format!("- Bajas del Mes (Clase 1): {}\n", self.kpis.bajas_mes));
        out.push_str(&format!(
            "- Headcount Activo (Clase 1): {}\n",
            self.kpis.hc_activos_c1
        ));
        if let Some(stats) = &self.trend.stats {
            let tendencia = if stats.slope > 0.1 {
                "En aumento"
            } else if stats.slope < -0.1 {
                "En disminución"
            } else {
                "Estable"
            };
            out.push_str(&format!("- Tendencia de Bajas: {tendencia}.\n"));
        }
        if let Some(last) = self.historical_yoy.last() {
            if let Some(var) = last.variacion_pct.filter(|v| v.is_finite()) {
                out.push_str(&format!(
                    "- Comparativa Anual: Este mes tuvo un {:.1}% {} bajas que el mismo mes del año anterior.\n",
                    var.abs(),
                    if var > 0.0 { "más" } else { "menos" }
                ));
            }
        }

        out.push_str("\n**2. Diagnóstico de Causa Raíz (¿Dónde y por qué?):**\n");
        out.push_str("- Puntos Críticos (Pareto):\n");
        for (label, table) in [
            ("Turno", &self.pareto.turno),
            ("Puesto", &self.pareto.puesto),
            ("Supervisor", &self.pareto.supervisor),
        ] {
            match table.first() {
                Some(top) => out.push_str(&format!(
                    "  - {} con más bajas: {} ({} bajas, {:.1}% del total).\n",
                    label, top.value, top.bajas, top.percentage
                )),
                None => out.push_str(&format!("  - {label} con más bajas: N/A.\n")),
            }
        }
        out.push_str("- Principales Motivos de Renuncia (Comentarios de empleados):\n");
        for (i, bar) in self.motivos.barras.iter().take(3).enumerate() {
            out.push_str(&format!(
                "  {}. {} ({} casos)\n",
                i + 1,
                bar.category,
                bar.bajas
            ));
        }

        out.push_str("\n**3. Diagnóstico de Retención (¿Cuándo se van?):**\n");
        let m = &self.survival_metrics;
        out.push_str(&format!(
            "- Retención a 90 días (S90): {:.1}%. (De cada 100 empleados nuevos, se espera que {:.0} causen baja antes de cumplir 3 meses).\n",
            m.s90 * 100.0,
            100.0 - m.s90 * 100.0
        ));
        out.push_str("- Riesgo de Baja Temprana (Probabilidad de renuncia para un nuevo ingreso):\n");
        out.push_str(&format!(
            "  - En los primeros 30 días: {}.\n",
            m.haz_0_30
                .map_or("N/A".to_string(), |h| format!("{:.1}%", h * 100.0))
        ));
        out.push_str(&format!(
            "  - Entre el día 31 y 60: {}.\n",
            m.haz_31_60
                .map_or("N/A".to_string(), |h| format!("{:.1}%", h * 100.0))
        ));
        out.push_str(&format!(
            "- Mediana de Supervivencia: {}.\n",
            m.mediana.map_or(
                "No alcanzada (más del 50% permanece más allá del periodo observado)".to_string(),
                |d| format!("{d} días")
            )
        ));

        out
    }
}
