//! Gemini backend implementation
//!
//! HTTP client for the Gemini generateContent API. Prompts come from the
//! prompt library; responses are constrained to JSON via the generation
//! config and parsed tolerantly on top of that.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::corrections::CorrectionsMap;
use crate::error::{Error, Result};
use crate::motivos::{AnalysisType, TAXONOMY};
use crate::prompts::{PromptId, PromptLibrary};

use super::parsing::{parse_categorized, parse_summary};
use super::{AiBackend, AiSummary};

const DEFAULT_HOST: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl Clone for GeminiBackend {
    fn clone(&self) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            prompts: self.prompts.clone(),
        }
    }
}

impl GeminiBackend {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Create from environment variables. Returns None without a credential.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok()?;
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let host = std::env::var("GEMINI_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        Some(Self::new(&host, &api_key, &model))
    }

    fn render_prompt(&self, id: PromptId, vars: &HashMap<&str, String>) -> Result<(Option<String>, String)> {
        let mut prompts = self
            .prompts
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
        let template = prompts.get(id)?;
        let system = template.system_section().map(|s| s.to_string());
        let user = template.render_user(vars);
        Ok((system, user))
    }

    async fn generate(
        &self,
        system: Option<String>,
        user: String,
        response_schema: serde_json::Value,
    ) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: user }],
            }],
            system_instruction: system.map(|text| Content {
                parts: vec![Part { text }],
            }),
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let response = self.http_client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(Error::Http(response.error_for_status().unwrap_err()));
        }

        let payload: GenerateResponse = response.json().await?;
        let text = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| Error::InvalidData("Empty response from Gemini".into()))?;
        debug!(chars = text.len(), "Gemini response received");
        Ok(text)
    }
}

/// Request to the generateContent API
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// Few-shot guidance block built from accumulated human corrections
fn examples_block(corrections: &CorrectionsMap) -> String {
    if corrections.is_empty() {
        return String::new();
    }
    let examples = corrections
        .iter()
        .map(|(comment, category)| {
            format!("- Comentario: \"{comment}\" -> Categoría Correcta: \"{category}\"")
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Para mejorar tu precisión, aquí tienes algunos ejemplos de \
         clasificaciones correctas realizadas por un humano. Úsalos como guía:\n{examples}\n\n---\n\n"
    )
}

fn categories_block() -> String {
    TAXONOMY
        .iter()
        .map(|(cat, keywords)| {
            format!("- \"{}\": Relacionado con temas como: {}.", cat, keywords.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl AiBackend for GeminiBackend {
    async fn classify_motives(
        &self,
        comments: &[String],
        corrections: &CorrectionsMap,
    ) -> Result<Vec<String>> {
        let mut vars = HashMap::new();
        vars.insert("count", comments.len().to_string());
        vars.insert("categories", categories_block());
        vars.insert("examples", examples_block(corrections));
        vars.insert("comments", serde_json::to_string(comments)?);

        let (system, user) = self.render_prompt(PromptId::ClassifyMotives, &vars)?;
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "categorized_comments": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" }
                }
            },
            "required": ["categorized_comments"]
        });

        debug!(comments = comments.len(), "Classifying comments with Gemini");
        let response = self.generate(system, user, schema).await?;
        parse_categorized(&response, comments.len())
    }

    async fn narrative_summary(&self, digest: &str) -> Result<AiSummary> {
        let mut vars = HashMap::new();
        vars.insert("digest", digest.to_string());

        let (system, user) = self.render_prompt(PromptId::NarrativeSummary, &vars)?;
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "diagnostico": { "type": "STRING" },
                "plan_de_accion": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "accion": { "type": "STRING" },
                            "porque": { "type": "STRING" },
                            "como": { "type": "STRING" }
                        },
                        "required": ["accion", "porque", "como"]
                    }
                }
            },
            "required": ["diagnostico", "plan_de_accion"]
        });

        let response = self.generate(system, user, schema).await?;
        parse_summary(&response)
    }

    async fn health_check(&self) -> bool {
        let url = format!(
            "{}/v1beta/models/{}?key={}",
            self.base_url, self.model, self.api_key
        );
        match self.http_client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn analysis_type(&self) -> AnalysisType {
        AnalysisType::Ml
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
