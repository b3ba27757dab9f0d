use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("Job timed out after {0:?}")]
    Timeout(Duration),

    #[error("Job cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Workspace error: {0}")]
    Workspace(String),
}

impl PipelineError {
    /// True for errors that stop the job regardless of fallback policy.
    pub fn is_interruption(&self) -> bool {
        matches!(self, PipelineError::Cancelled | PipelineError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
