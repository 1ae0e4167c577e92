//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Merma - Monthly employee attrition analytics
#[derive(Parser)]
#[command(name = "merma")]
#[command(about = "Attrition analytics over workforce spreadsheet exports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory (corrections store, prompt overrides).
    /// Defaults to the platform data dir (~/.local/share/merma)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full attrition analysis over the three exports
    Analyze {
        /// Active roster CSV
        #[arg(long)]
        activo: PathBuf,

        /// Separations CSV
        #[arg(long)]
        bajas: PathBuf,

        /// Rotation matrix CSV
        #[arg(long)]
        matriz: PathBuf,

        /// Write the full JSON report here (printed to stdout otherwise)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Client name (auto-detected from filenames if not specified)
        #[arg(long)]
        client: Option<String>,

        /// Spanish month name for the reporting period
        /// (auto-detected from the matrix filename if not specified)
        #[arg(long)]
        mes: Option<String>,

        /// Censoring cutoff date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        cutoff: Option<String>,

        /// Skip the AI backend entirely (keyword classification, no summary)
        #[arg(long)]
        no_ai: bool,
    },

    /// Manage human reclassifications of survey comments
    Corrections {
        #[command(subcommand)]
        action: Option<CorrectionsAction>,
    },

    /// Classify a single comment (for testing the classifier setup)
    Classify {
        /// The comment text
        text: String,
    },
}

#[derive(Subcommand)]
pub enum CorrectionsAction {
    /// List stored corrections
    List,

    /// Add or overwrite a correction
    Add {
        /// Exact comment text
        comment: String,

        /// Taxonomy category to assign
        category: String,
    },

    /// Remove a correction by its exact comment text
    Remove {
        /// Exact comment text
        comment: String,
    },

    /// Print the corrections file path
    Path,
}
