//! Error types for Anchorsmith.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Configuration-level failures stop a run before any row is processed.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Input(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
