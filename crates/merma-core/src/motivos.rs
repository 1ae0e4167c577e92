//! Free-text separation-reason categorization
//!
//! Exit-survey comments are classified into a fixed 16-category taxonomy.
//! The remote classifier (see `ai`) is preferred; this module holds the
//! deterministic keyword fallback, the survey-column detection, and the
//! aggregation of final categories into the motives bundle. A human
//! correction for the exact comment text always wins over either classifier.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corrections::CorrectionsMap;
use crate::models::{CanonicalRecord, Spell};
use crate::schema::fold_diacritics;

/// Category assigned when nothing matches (and the one the remote classifier
/// is told it may not use)
pub const OTROS_REVISAR: &str = "Otros/Revisar";

/// Comments shorter than this (after trimming) are not classified
pub const MIN_COMMENT_LEN: usize = 5;

/// Categories shown as detail cards, at most
const MAX_CARDS: usize = 12;

/// The 16-category taxonomy with its keyword phrases, in declaration order.
/// The keyword matcher tests categories top to bottom and phrases left to
/// right; the first whole-word hit wins.
pub const TAXONOMY: &[(&str, &[&str])] = &[
    (
        "Mejor Oportunidad Salarial / Laboral",
        &[
            "mejor oportunidad",
            "mejor oferta",
            "ofrecieron mas",
            "otro trabajo",
            "otra empresa",
            "empleo mejor pagado",
            "mejor pagado",
            "paga mejor",
            "sube sueldo",
            "cambio por salario",
            "cambio por sueldo",
            "cambio laboral",
        ],
    ),
    (
        "Problemas con el supervisor",
        &[
            "jefe",
            "jefa",
            "supervisor",
            "lider",
            "coordinador",
            "gerente",
            "mando",
            "maltrato",
            "gritos",
            "humillacion",
            "falta de respeto",
            "prepotencia",
            "favoritismo",
            "injusticia",
            "represalias",
            "amenazas",
            "acoso laboral",
            "hostigamiento",
            "mal liderazgo",
            "abuso autoridad",
        ],
    ),
    (
        "Horarios / Turnos",
        &[
            "turno",
            "rolar",
            "nocturno",
            "noche",
            "jornada",
            "horario",
            "horas extra",
            "descanso",
            "fin de semana",
            "12x12",
            "4x3",
            "disponibilidad",
            "entrada",
            "salida",
        ],
    ),
    (
        "Problemas con el área",
        &[
            "area",
            "departamento",
            "depto",
            "linea",
            "no me gusta el area",
            "cambio de area",
            "me cambiaron de area",
        ],
    ),
    (
        "Falta de herramientas",
        &[
            "falta de herramienta",
            "no hay herramientas",
            "equipo insuficiente",
            "equipo defectuoso",
            "no hay material",
            "insumos insuficientes",
        ],
    ),
    (
        "No le gusto el trabajo",
        &[
            "no me gusto el trabajo",
            "no me gusto el puesto",
            "no era lo que esperaba",
            "no me adapte",
            "no me acostumbre",
            "no me convence",
        ],
    ),
    (
        "Problemas de salud",
        &[
            "salud",
            "enfermo",
            "enfermedad",
            "operacion",
            "lesion",
            "dolor",
            "consulta medica",
            "medico",
            "terapia",
            "hospital",
            "incapacidad",
            "embarazo",
        ],
    ),
    (
        "Problema de transporte",
        &[
            "transporte",
            "camion",
            "ruta",
            "retrasos transporte",
            "traslado",
            "distancia",
            "lejos",
            "no hay transporte",
        ],
    ),
    (
        "Problemas legales",
        &[
            "legal",
            "proceso legal",
            "demanda",
            "cita judicial",
            "carcel",
            "policia",
            "detenido",
        ],
    ),
    (
        "Escuela",
        &[
            "estudios",
            "escuela",
            "universidad",
            "prepa",
            "clases",
            "tareas",
            "examen",
            "horario escolar",
        ],
    ),
    (
        "Cuidado de hijos / Familiar enfermo",
        &[
            "cuidado de hijos",
            "hijo enfermo",
            "familiar enfermo",
            "cuidar a mi mama",
            "cuidar a mi papa",
            "guarderia",
        ],
    ),
    (
        "Cambio de residencia / ciudad",
        &[
            "mudanza",
            "cambio de residencia",
            "cambio de ciudad",
            "me voy a otra ciudad",
            "regreso a mi ciudad",
        ],
    ),
    (
        "Muerte de familiar",
        &["fallecimiento", "muerte de", "luto", "duelo", "funeral"],
    ),
    (
        "Atender asuntos fuera de la ciudad",
        &[
            "viaje",
            "salir de la ciudad",
            "fuera de la ciudad",
            "asuntos personales fuera",
        ],
    ),
    (
        "Ambiente laboral",
        &[
            "ambiente",
            "clima",
            "equipo",
            "companeros",
            "conflictos",
            "chismes",
            "pleitos",
            "bullying",
            "discriminacion",
            "estres",
            "toxico",
            "mal ambiente",
        ],
    ),
    (
        "Capacitacion",
        &[
            "capacitacion",
            "falta de capacitacion",
            "no me capacitaron",
            "entrenamiento",
            "no me ensenaron",
            "poca capacitacion",
        ],
    ),
];

/// Category names in declaration order
pub fn category_names() -> Vec<&'static str> {
    TAXONOMY.iter().map(|(name, _)| *name).collect()
}

fn keyword_regexes() -> &'static Vec<(&'static str, Vec<Regex>)> {
    static REGEXES: OnceLock<Vec<(&'static str, Vec<Regex>)>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        TAXONOMY
            .iter()
            .map(|(cat, keywords)| {
                let patterns = keywords
                    .iter()
                    .map(|kw| {
                        let folded = fold_diacritics(kw);
                        Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&folded)))
                            .expect("taxonomy keyword compiles")
                    })
                    .collect();
                (*cat, patterns)
            })
            .collect()
    })
}

/// Deterministic closed-set classification of one comment.
///
/// Diacritic-folds and lower-cases the text, then tests every taxonomy
/// keyword as a whole word in declaration order. Comments under
/// [`MIN_COMMENT_LEN`] characters or with no hit land in [`OTROS_REVISAR`].
pub fn assign_closed_set(text: &str) -> &'static str {
    let folded = fold_diacritics(text.trim()).to_lowercase();
    if folded.chars().count() < MIN_COMMENT_LEN {
        return OTROS_REVISAR;
    }
    for (cat, patterns) in keyword_regexes() {
        if patterns.iter().any(|p| p.is_match(&folded)) {
            return cat;
        }
    }
    OTROS_REVISAR
}

/// Find the column carrying exit-survey free text.
///
/// Survey-specific header patterns are preferred; generic comment-ish
/// headers are the fallback. First match wins, `None` when nothing looks
/// like free text.
pub fn detect_text_col(records: &[CanonicalRecord]) -> Option<String> {
    let first = records.first()?;
    let columns = first.column_names();

    static PRIORITY: OnceLock<Vec<Regex>> = OnceLock::new();
    let priority = PRIORITY.get_or_init(|| {
        [
            r"encuesta.*salida.*4frh",
            r"4frh.*encuesta.*salida",
            r"encuesta.*salida",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("column pattern compiles"))
        .collect()
    });

    for pattern in priority {
        if let Some(col) = columns
            .iter()
            .find(|c| pattern.is_match(&fold_diacritics(c).to_lowercase()))
        {
            return Some(col.clone());
        }
    }

    static GENERIC: OnceLock<Regex> = OnceLock::new();
    let generic = GENERIC
        .get_or_init(|| Regex::new(r"encuesta|salida|coment|observac|motivo").expect("compiles"));
    columns
        .iter()
        .find(|c| generic.is_match(&fold_diacritics(c).to_lowercase()))
        .cloned()
}

/// Whether a comment is long enough to be classified
pub fn is_eligible(comment: &str) -> bool {
    comment.trim().chars().count() >= MIN_COMMENT_LEN
}

/// Classification method actually used for the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// Remote model classification
    Ml,
    /// Local keyword fallback
    Keywords,
}

/// One employee row inside a category card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotivoDetail {
    pub empleado: String,
    pub nombre: String,
    pub fecha_baja: Option<NaiveDate>,
    pub comentario: String,
}

/// Category frequency bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotivoBar {
    pub category: String,
    pub bajas: usize,
}

/// Per-category detail card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotivoCard {
    pub category: String,
    pub count: usize,
    pub details: Vec<MotivoDetail>,
}

/// Categorized-motives bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotivosData {
    pub barras: Vec<MotivoBar>,
    pub cards: Vec<MotivoCard>,
    pub has_data: bool,
    pub text_col: Option<String>,
    pub analysis_type: AnalysisType,
}

impl MotivosData {
    pub fn empty() -> Self {
        Self {
            barras: Vec::new(),
            cards: Vec::new(),
            has_data: false,
            text_col: None,
            analysis_type: AnalysisType::Keywords,
        }
    }
}

/// Apply the correction override: the classifier's label for a comment is
/// replaced whenever the exact comment text is a correction key.
pub fn apply_corrections(
    comments: &[String],
    categories: &[String],
    corrections: &CorrectionsMap,
) -> Vec<String> {
    comments
        .iter()
        .zip(categories)
        .map(|(comment, category)| {
            corrections
                .get(comment.as_str())
                .cloned()
                .unwrap_or_else(|| category.clone())
        })
        .collect()
}

/// Aggregate final categories into the motives bundle.
///
/// `rows` are the month's eligible source records, `comments` their survey
/// texts and `finals` the post-override category per comment, all three in
/// the same order. Detail rows join the full spell profile under the source
/// record, so a card shows the employee's name even when the survey export
/// lacks it.
pub fn aggregate(
    rows: &[&CanonicalRecord],
    comments: &[String],
    finals: &[String],
    spells: &[Spell],
    text_col: &str,
    analysis_type: AnalysisType,
) -> MotivosData {
    if rows.is_empty() {
        return MotivosData {
            text_col: Some(text_col.to_string()),
            analysis_type,
            ..MotivosData::empty()
        };
    }

    let spells_by_id: std::collections::HashMap<&str, &Spell> =
        spells.iter().map(|s| (s.empleado.as_str(), s)).collect();

    // declaration-order grouping keeps the output deterministic for ties
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: std::collections::HashMap<&str, Vec<MotivoDetail>> =
        std::collections::HashMap::new();

    for ((row, comment), category) in rows.iter().zip(comments).zip(finals) {
        let profile = spells_by_id.get(row.empleado.as_str()).copied();
        let nombre = row
            .nombre
            .clone()
            .or_else(|| profile.and_then(|p| p.nombre.clone()))
            .unwrap_or_default();
        let fecha_baja = row.fecha_baja.or(profile.and_then(|p| p.fecha_baja));

        if !grouped.contains_key(category.as_str()) {
            order.push(category.as_str());
        }
        grouped.entry(category.as_str()).or_default().push(MotivoDetail {
            empleado: row.empleado.clone(),
            nombre,
            fecha_baja,
            comentario: comment.clone(),
        });
    }

    let mut barras: Vec<MotivoBar> = order
        .iter()
        .map(|cat| MotivoBar {
            category: cat.to_string(),
            bajas: grouped[cat].len(),
        })
        .collect();
    barras.sort_by(|a, b| b.bajas.cmp(&a.bajas).then_with(|| a.category.cmp(&b.category)));

    let cards: Vec<MotivoCard> = barras
        .iter()
        .take(MAX_CARDS)
        .map(|bar| {
            let mut details = grouped[bar.category.as_str()].clone();
            details.sort_by(|a, b| b.fecha_baja.cmp(&a.fecha_baja));
            MotivoCard {
                category: bar.category.clone(),
                count: details.len(),
                details,
            }
        })
        .collect();

    debug!(
        comments = comments.len(),
        categories = barras.len(),
        "Aggregated categorized motives"
    );

    MotivosData {
        barras,
        cards,
        has_data: true,
        text_col: Some(text_col.to_string()),
        analysis_type,
    }
}
