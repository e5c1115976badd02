// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load persona input: {0}")]
    InputLoad(String),

    #[error("No PDF documents found in {}", .0.display())]
    NoDocuments(PathBuf),

    #[error("No text chunks could be extracted from {documents} document(s)")]
    NoChunks { documents: usize },

    #[error("Failed to parse document {document}: {message}")]
    DocumentParse { document: String, message: String },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("File operation failed for {}: {source}", .path.display())]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl PipelineError {
    pub fn document_parse(document: impl Into<String>, message: impl ToString) -> Self {
        Self::DocumentParse {
            document: document.into(),
            message: message.to_string(),
        }
    }
}
