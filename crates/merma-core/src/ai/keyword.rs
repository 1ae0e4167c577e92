//! Deterministic keyword backend
//!
//! Local fallback classifier used whenever the remote backend is
//! unavailable, misconfigured, or returns malformed output. Same contract as
//! the remote backend: one category per comment, in order.

use async_trait::async_trait;

use crate::corrections::CorrectionsMap;
use crate::error::{Error, Result};
use crate::motivos::{assign_closed_set, AnalysisType};

use super::{AiBackend, AiSummary};

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordBackend;

impl KeywordBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AiBackend for KeywordBackend {
    async fn classify_motives(
        &self,
        comments: &[String],
        _corrections: &CorrectionsMap,
    ) -> Result<Vec<String>> {
        Ok(comments
            .iter()
            .map(|c| assign_closed_set(c).to_string())
            .collect())
    }

    async fn narrative_summary(&self, _digest: &str) -> Result<AiSummary> {
        Err(Error::NotFound(
            "Narrative summary requires a remote AI backend".into(),
        ))
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn analysis_type(&self) -> AnalysisType {
        AnalysisType::Keywords
    }

    fn model(&self) -> &str {
        "keywords"
    }

    fn host(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_one_category_per_comment_in_order() {
        let backend = KeywordBackend::new();
        let comments = vec![
            "me regreso a la escuela".to_string(),
            "xx".to_string(),
            "problemas con mi jefe".to_string(),
        ];

        let cats = backend
            .classify_motives(&comments, &CorrectionsMap::new())
            .await
            .unwrap();
        assert_eq!(
            cats,
            vec![
                "Escuela".to_string(),
                "Otros/Revisar".to_string(),
                "Problemas con el supervisor".to_string(),
            ]
        );
    }
}
