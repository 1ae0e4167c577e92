//! Merma Core Library
//!
//! Shared functionality for the merma attrition analytics tool:
//! - CSV import for the three workforce exports
//! - Schema normalization onto a canonical field vocabulary
//! - Record reconciliation (Bajas ← Matriz enrichment, spell assembly)
//! - Reporting-period resolution
//! - KPI and Pareto computation
//! - Kaplan-Meier survival analysis (global, conditional, grouped, cohort)
//! - Monthly trend regression, forecast, and year-over-year comparison
//! - Free-text motive categorization with correction override
//! - Pluggable AI backends (Gemini, keyword fallback, mock)
//! - Prompt library for customizable AI prompts
//! - Persisted human-correction store

pub mod ai;
pub mod corrections;
pub mod engine;
pub mod error;
pub mod import;
pub mod kpi;
pub mod models;
pub mod motivos;
pub mod pareto;
pub mod period;
pub mod prompts;
pub mod reconcile;
pub mod report;
pub mod schema;
pub mod survival;
pub mod trend;

pub use ai::{ActionItem, AiBackend, AiClient, AiSummary, GeminiBackend, KeywordBackend, MockBackend};
pub use corrections::{CorrectionStore, CorrectionsMap};
pub use engine::{run_analysis, AnalysisInputs, AnalysisOptions};
pub use error::{Error, Result};
pub use kpi::Kpis;
pub use models::{CanonicalRecord, Period, RawRecord, SourceKind, Spell, TipoBaja};
pub use motivos::{AnalysisType, MotivosData};
pub use pareto::{Clasificacion, ParetoRecord};
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use report::{ParetoTables, ReportData};
pub use survival::{
    CohortSurvival, GroupSurvival, KmConditionalPoint, KmPoint, SurvivalMetrics,
};
pub use trend::{TrendAnalysis, TrendPoint, YoYPoint};
