//! Pluggable AI backend abstraction
//!
//! The engine has two external collaborators: a comment classifier and a
//! narrative-summary generator. Both sit behind the [`AiBackend`] trait so
//! the fallback contract (same input/output shape) is enforced at the type
//! boundary rather than by inline branching.
//!
//! # Architecture
//!
//! - `AiBackend` trait: defines the interface for both AI operations
//! - `AiClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend` (remote), `KeywordBackend`
//!   (deterministic local), `MockBackend` (tests)
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (gemini, keyword, mock). Default: gemini
//! - `GEMINI_API_KEY` (alias `API_KEY`): credential, required for gemini
//! - `GEMINI_MODEL`: model name (default: gemini-2.5-flash)
//! - `GEMINI_HOST`: API host (default: https://generativelanguage.googleapis.com)

mod gemini;
mod keyword;
mod mock;
pub mod parsing;

pub use gemini::GeminiBackend;
pub use keyword::KeywordBackend;
pub use mock::MockBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::corrections::CorrectionsMap;
use crate::error::Result;
use crate::motivos::AnalysisType;

/// One recommended action in the narrative summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItem {
    /// What to do
    pub accion: String,
    /// The data point justifying it
    pub porque: String,
    /// Practical steps
    pub como: String,
}

/// Narrative diagnosis + action plan returned by the summary collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSummary {
    pub summary: String,
    pub actions: Vec<ActionItem>,
}

/// Trait defining the interface for all AI backends
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Classify exit-survey comments into the 16-category taxonomy.
    ///
    /// Must return exactly one category per input comment, in order.
    /// Corrections are passed along as few-shot guidance; the override
    /// itself is applied by the caller, never here.
    async fn classify_motives(
        &self,
        comments: &[String],
        corrections: &CorrectionsMap,
    ) -> Result<Vec<String>>;

    /// Generate the narrative summary from the report digest
    async fn narrative_summary(&self, digest: &str) -> Result<AiSummary>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Which analysis type results from this backend count as
    fn analysis_type(&self) -> AnalysisType;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AiClient {
    /// Gemini backend (HTTP API)
    Gemini(GeminiBackend),
    /// Deterministic keyword backend (no network)
    Keyword(KeywordBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AiClient {
    /// Create an AI client from environment variables.
    ///
    /// Returns None when the selected backend's credentials are missing —
    /// the capability check that sends the run down the keyword path.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "gemini".to_string());

        match backend.to_lowercase().as_str() {
            "gemini" => GeminiBackend::from_env().map(AiClient::Gemini),
            "keyword" | "keywords" => Some(AiClient::Keyword(KeywordBackend::new())),
            "mock" => Some(AiClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to gemini");
                GeminiBackend::from_env().map(AiClient::Gemini)
            }
        }
    }

    /// Create a Gemini backend directly
    pub fn gemini(host: &str, api_key: &str, model: &str) -> Self {
        AiClient::Gemini(GeminiBackend::new(host, api_key, model))
    }

    /// Create a keyword backend directly
    pub fn keyword() -> Self {
        AiClient::Keyword(KeywordBackend::new())
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AiClient::Mock(MockBackend::new())
    }
}

// Implement AiBackend for AiClient by delegating to the inner backend
#[async_trait]
impl AiBackend for AiClient {
    async fn classify_motives(
        &self,
        comments: &[String],
        corrections: &CorrectionsMap,
    ) -> Result<Vec<String>> {
        match self {
            AiClient::Gemini(b) => b.classify_motives(comments, corrections).await,
            AiClient::Keyword(b) => b.classify_motives(comments, corrections).await,
            AiClient::Mock(b) => b.classify_motives(comments, corrections).await,
        }
    }

    async fn narrative_summary(&self, digest: &str) -> Result<AiSummary> {
        match self {
            AiClient::Gemini(b) => b.narrative_summary(digest).await,
            AiClient::Keyword(b) => b.narrative_summary(digest).await,
            AiClient::Mock(b) => b.narrative_summary(digest).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AiClient::Gemini(b) => b.health_check().await,
            AiClient::Keyword(b) => b.health_check().await,
            AiClient::Mock(b) => b.health_check().await,
        }
    }

    fn analysis_type(&self) -> AnalysisType {
        match self {
            AiClient::Gemini(b) => b.analysis_type(),
            AiClient::Keyword(b) => b.analysis_type(),
            AiClient::Mock(b) => b.analysis_type(),
        }
    }

    fn model(&self) -> &str {
        match self {
            AiClient::Gemini(b) => b.model(),
            AiClient::Keyword(b) => b.model(),
            AiClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AiClient::Gemini(b) => b.host(),
            AiClient::Keyword(b) => b.host(),
            AiClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keyword_client() {
        let client = AiClient::keyword();
        assert!(client.health_check().await);
        assert_eq!(client.analysis_type(), AnalysisType::Keywords);

        let comments = vec!["problemas con mi jefe".to_string()];
        let cats = client
            .classify_motives(&comments, &CorrectionsMap::new())
            .await
            .unwrap();
        assert_eq!(cats, vec!["Problemas con el supervisor".to_string()]);
    }

    #[tokio::test]
    async fn test_keyword_client_has_no_narrative() {
        let client = AiClient::keyword();
        assert!(client.narrative_summary("digest").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_client() {
        let client = AiClient::mock();
        assert_eq!(client.analysis_type(), AnalysisType::Ml);
        let summary = client.narrative_summary("digest").await.unwrap();
        assert!(!summary.summary.is_empty());
        assert!(!summary.actions.is_empty());
    }
}
