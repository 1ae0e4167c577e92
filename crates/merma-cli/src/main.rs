//! Merma CLI - Attrition analytics over workforce exports
//!
//! Usage:
//!   merma analyze --activo A.csv --bajas B.csv --matriz M.csv
//!   merma corrections add "comentario" "Categoría"
//!   merma classify "no me gusta rolar turno"

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Analyze {
            activo,
            bajas,
            matriz,
            output,
            client,
            mes,
            cutoff,
            no_ai,
        } => {
            commands::cmd_analyze(
                cli.data_dir.as_deref(),
                &activo,
                &bajas,
                &matriz,
                output.as_deref(),
                client,
                mes,
                cutoff.as_deref(),
                no_ai,
            )
            .await
        }
        Commands::Corrections { action } => {
            let store = commands::open_store(cli.data_dir.as_deref());
            match action {
                None | Some(CorrectionsAction::List) => commands::cmd_corrections_list(&store),
                Some(CorrectionsAction::Add { comment, category }) => {
                    commands::cmd_corrections_add(&store, &comment, &category)
                }
                Some(CorrectionsAction::Remove { comment }) => {
                    commands::cmd_corrections_remove(&store, &comment)
                }
                Some(CorrectionsAction::Path) => commands::cmd_corrections_path(&store),
            }
        }
        Commands::Classify { text } => commands::cmd_classify(&text).await,
    }
}
