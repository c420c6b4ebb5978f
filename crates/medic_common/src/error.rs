//! Error types for medic.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MedicError>;

#[derive(Error, Debug)]
pub enum MedicError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MedicError {
    /// Short machine-readable kind for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            MedicError::Llm(_) => "llm",
            MedicError::Embedding(_) => "embedding",
            MedicError::Json(_) => "json",
        }
    }
}
