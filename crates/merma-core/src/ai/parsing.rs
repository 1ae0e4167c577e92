//! JSON parsing helpers for AI backend responses
//!
//! These functions extract JSON from model responses, which often include
//! extra text before/after the JSON payload.

use serde::Deserialize;

use crate::error::{Error, Result};

use super::{ActionItem, AiSummary};

/// Locate the outermost JSON object in a model response
fn extract_json(response: &str) -> Result<&str> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            truncate(response)
        ))),
    }
}

fn truncate(s: &str) -> String {
    if s.len() > 200 {
        let mut end = 200;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    } else {
        s.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct CategorizedComments {
    categorized_comments: Vec<String>,
}

/// Parse the classifier response and enforce the one-category-per-comment
/// contract. A count mismatch is invalid output, not a partial result.
pub fn parse_categorized(response: &str, expected: usize) -> Result<Vec<String>> {
    let json_str = extract_json(response)?;
    let parsed: CategorizedComments = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!("Invalid JSON from AI: {} | Raw: {}", e, truncate(json_str)))
    })?;

    if parsed.categorized_comments.len() != expected {
        return Err(Error::InvalidData(format!(
            "Classifier returned {} categories for {} comments",
            parsed.categorized_comments.len(),
            expected
        )));
    }
    Ok(parsed.categorized_comments)
}

#[derive(Debug, Deserialize)]
struct NarrativePayload {
    diagnostico: String,
    plan_de_accion: Vec<ActionItem>,
}

/// Parse the narrative-summary response
pub fn parse_summary(response: &str) -> Result<AiSummary> {
    let json_str = extract_json(response)?;
    let parsed: NarrativePayload = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!("Invalid summary JSON from AI: {}", e))
    })?;
    Ok(AiSummary {
        summary: parsed.diagnostico,
        actions: parsed.plan_de_accion,
    })
}
