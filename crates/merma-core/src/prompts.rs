//! Prompt library for the AI backends
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/merma/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! This allows users to customize prompts without modifying the source,
//! while automatically getting new default prompts on upgrade.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const CLASSIFY_MOTIVES: &str = include_str!("../../../prompts/classify_motives.md");
    pub const NARRATIVE_SUMMARY: &str = include_str!("../../../prompts/narrative_summary.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Closed-set classification of exit-survey comments
    ClassifyMotives,
    /// Narrative diagnosis + action plan over the report digest
    NarrativeSummary,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClassifyMotives => "classify_motives",
            Self::NarrativeSummary => "narrative_summary",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[Self::ClassifyMotives, Self::NarrativeSummary]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::ClassifyMotives => defaults::CLASSIFY_MOTIVES,
            Self::NarrativeSummary => defaults::NARRATIVE_SUMMARY,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    pub version: u32,
    pub task_type: String,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    pub content: String,
    pub is_override: bool,
}

impl Prompt {
    /// Get the system section of the prompt
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    /// Get the user section of the prompt
    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render the user section with `{{var}}` template variables replaced
    pub fn render_user(&self, vars: &HashMap<&str, String>) -> String {
        let mut result = self.user_section().unwrap_or(&self.content).to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{key}}}}}"), value);
        }
        result
    }
}

/// Extract the body of a `# Heading` section up to the next top-level heading
fn extract_section<'a>(content: &'a str, heading: &str) -> Option<&'a str> {
    let start = content.find(heading)? + heading.len();
    let rest = &content[start..];
    let end = rest.find("\n# ").unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn parse_prompt(raw: &str, is_override: bool) -> Result<Prompt> {
    let rest = raw
        .strip_prefix("---")
        .ok_or_else(|| Error::Prompt("Missing frontmatter".into()))?;
    let end = rest
        .find("\n---")
        .ok_or_else(|| Error::Prompt("Unterminated frontmatter".into()))?;
    let metadata: PromptMetadata = serde_yaml::from_str(&rest[..end])
        .map_err(|e| Error::Prompt(format!("Invalid frontmatter: {e}")))?;
    Ok(Prompt {
        metadata,
        content: rest[end + 4..].trim_start().to_string(),
        is_override,
    })
}

/// Two-layer prompt resolution: data-dir overrides, then embedded defaults
#[derive(Debug, Default)]
pub struct PromptLibrary {
    overrides_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    pub fn new() -> Self {
        let overrides_dir = dirs::data_dir().map(|d| d.join("merma").join("prompts"));
        Self {
            overrides_dir,
            cache: HashMap::new(),
        }
    }

    /// Library with a specific overrides directory (tests)
    pub fn with_overrides_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            overrides_dir: Some(dir.into()),
            cache: HashMap::new(),
        }
    }

    /// Load a prompt, preferring an override file when one exists
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.cache.contains_key(&id) {
            let prompt = self.load(id)?;
            self.cache.insert(id, prompt);
        }
        Ok(&self.cache[&id])
    }

    fn load(&self, id: PromptId) -> Result<Prompt> {
        if let Some(dir) = &self.overrides_dir {
            let path = dir.join(format!("{}.md", id.as_str()));
            if path.exists() {
                let raw = fs::read_to_string(&path)?;
                return parse_prompt(&raw, true);
            }
        }
        parse_prompt(id.default_content(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_parse() {
        let mut lib = PromptLibrary::with_overrides_dir("/nonexistent");
        for id in PromptId::all() {
            let prompt = lib.get(*id).unwrap();
            assert_eq!(prompt.metadata.id, id.as_str());
            assert!(!prompt.is_override);
            assert!(prompt.system_section().is_some());
            assert!(prompt.user_section().is_some());
        }
    }

    #[test]
    fn test_render_user_replaces_vars() {
        let mut lib = PromptLibrary::with_overrides_dir("/nonexistent");
        let prompt = lib.get(PromptId::ClassifyMotives).unwrap().clone();

        let mut vars = HashMap::new();
        vars.insert("count", "3".to_string());
        vars.insert("categories", "- \"Escuela\"".to_string());
        vars.insert("examples", String::new());
        vars.insert("comments", "[\"a\",\"b\",\"c\"]".to_string());

        let rendered = prompt.render_user(&vars);
        assert!(rendered.contains("los siguientes 3 comentarios"));
        assert!(rendered.contains("- \"Escuela\""));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn test_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classify_motives.md");
        fs::write(
            &path,
            "---\nid: classify_motives\nversion: 2\ntask_type: fast_classification\n---\n\n# System\n\nCustom.\n\n# User\n\n{{comments}}\n",
        )
        .unwrap();

        let mut lib = PromptLibrary::with_overrides_dir(dir.path());
        let prompt = lib.get(PromptId::ClassifyMotives).unwrap();
        assert!(prompt.is_override);
        assert_eq!(prompt.metadata.version, 2);
        assert_eq!(prompt.system_section(), Some("Custom."));
    }
}
