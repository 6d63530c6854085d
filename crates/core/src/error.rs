use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed project file {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
    #[error("Malformed solution file {path}: {reason}")]
    Solution { path: PathBuf, reason: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
    #[error("Scan was cancelled")]
    Cancelled,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for ScopeError {
    fn from(err: tokio::task::JoinError) -> Self {
        ScopeError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScopeError>;
