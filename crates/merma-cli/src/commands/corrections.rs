//! Corrections store command implementations

use std::path::Path;

use anyhow::{Context, Result};
use merma_core::motivos::category_names;
use merma_core::{CorrectionStore, CorrectionsMap};

/// Open the corrections store, honoring an explicit data directory
pub fn open_store(data_dir: Option<&Path>) -> CorrectionStore {
    match data_dir {
        Some(dir) => CorrectionStore::new(dir.join("corrections.json")),
        None => CorrectionStore::new(CorrectionStore::default_path()),
    }
}

pub fn cmd_corrections_list(store: &CorrectionStore) -> Result<()> {
    let corrections = store.load().context("Failed to read corrections store")?;

    if corrections.is_empty() {
        println!("No corrections stored yet.");
        println!("Add one with: merma corrections add \"<comentario>\" \"<categoría>\"");
        return Ok(());
    }

    println!("{} correction(s):", corrections.len());
    for (comment, category) in &corrections {
        println!("  \"{}\" -> {}", comment, category);
    }
    Ok(())
}

pub fn cmd_corrections_add(store: &CorrectionStore, comment: &str, category: &str) -> Result<()> {
    let known = category_names();
    if !known.contains(&category) && category != merma_core::motivos::OTROS_REVISAR {
        anyhow::bail!(
            "Unknown category: {}\nValid categories:\n  {}",
            category,
            known.join("\n  ")
        );
    }

    let mut update = CorrectionsMap::new();
    update.insert(comment.to_string(), category.to_string());
    store
        .merge_write(&update)
        .context("Failed to write corrections store")?;

    println!("✅ Stored: \"{}\" -> {}", comment, category);
    Ok(())
}

pub fn cmd_corrections_remove(store: &CorrectionStore, comment: &str) -> Result<()> {
    let existed = store
        .remove(comment)
        .context("Failed to update corrections store")?;
    if existed {
        println!("✅ Removed correction for \"{}\"", comment);
    } else {
        println!("No correction stored for \"{}\"", comment);
    }
    Ok(())
}

pub fn cmd_corrections_path(store: &CorrectionStore) -> Result<()> {
    println!("{}", store.path().display());
    Ok(())
}
