//! One-shot classifier test command

use anyhow::Result;
use merma_core::{AiBackend, AiClient, CorrectionsMap};

/// Classify a single comment with the configured backend, falling back to
/// the keyword classifier exactly like a full run would.
pub async fn cmd_classify(text: &str) -> Result<()> {
    let comments = vec![text.to_string()];

    if let Some(client) = AiClient::from_env() {
        println!("🔎 Backend: {} ({})", client.model(), client.host());
        match client.classify_motives(&comments, &CorrectionsMap::new()).await {
            Ok(categories) if categories.len() == 1 => {
                println!("   \"{}\" -> {}", text, categories[0]);
                return Ok(());
            }
            Ok(_) => println!("⚠️  Backend returned a mismatched count, using keywords"),
            Err(e) => println!("⚠️  Backend failed ({}), using keywords", e),
        }
    } else {
        println!("🔎 No AI backend configured, using keywords");
    }

    let category = merma_core::motivos::assign_closed_set(text);
    println!("   \"{}\" -> {}", text, category);
    Ok(())
}
