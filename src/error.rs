use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplaycovError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown program for '{0}'")]
    UnknownProgram(String),
}

pub type Result<T> = std::result::Result<T, ReplaycovError>;
