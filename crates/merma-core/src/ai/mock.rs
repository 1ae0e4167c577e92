//! Mock backend for testing
//!
//! Stands in for the remote classifier in unit tests and development without
//! a credential. Classification is deterministic (keyword table) but the
//! results count as `ml`, matching the shape of a healthy remote run.

use async_trait::async_trait;

use crate::corrections::CorrectionsMap;
use crate::error::{Error, Result};
use crate::motivos::{assign_closed_set, AnalysisType};

use super::{ActionItem, AiBackend, AiSummary};

#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self { healthy: true }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self { healthy: false }
    }
}

#[async_trait]
impl AiBackend for MockBackend {
    async fn classify_motives(
        &self,
        comments: &[String],
        _corrections: &CorrectionsMap,
    ) -> Result<Vec<String>> {
        if !self.healthy {
            return Err(Error::InvalidData("Mock backend is unhealthy".into()));
        }
        Ok(comments
            .iter()
            .map(|c| assign_closed_set(c).to_string())
            .collect())
    }

    async fn narrative_summary(&self, _digest: &str) -> Result<AiSummary> {
        if !self.healthy {
            return Err(Error::InvalidData("Mock backend is unhealthy".into()));
        }
        Ok(AiSummary {
            summary: "La rotación del periodo se concentra en los primeros 90 días.".into(),
            actions: vec![ActionItem {
                accion: "Reforzar el onboarding".into(),
                porque: "La mayor pérdida ocurre antes del día 90".into(),
                como: "Asignar un mentor durante las primeras 12 semanas".into(),
            }],
        })
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn analysis_type(&self) -> AnalysisType {
        AnalysisType::Ml
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
