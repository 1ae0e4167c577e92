//! Error types for merma

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Corrections store error: {0}")]
    Corrections(String),
}

pub type Result<T> = std::result::Result<T, Error>;
