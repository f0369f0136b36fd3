// Library error type
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinkvetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),
    #[error("No input files found in {0}")]
    NoInputFiles(PathBuf),
    #[error("Invalid keyword dictionary: {0}")]
    Dictionary(String),
    #[error("Missing required column '{column}' in {path}")]
    MissingColumn { column: String, path: PathBuf },
}

pub type Result<T> = std::result::Result<T, LinkvetError>;
