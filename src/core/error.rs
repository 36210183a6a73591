use std::path::PathBuf;
use thiserror::Error;

/// Conditions that stop one joke (or one performance) from being rated.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("no metadata file (response.txt or response.json) in {0}")]
    MetadataNotFound(PathBuf),
    #[error("malformed metadata in {path}, line {line}: segment '{segment}' has no ':'")]
    MalformedMetadata {
        path: PathBuf,
        line: usize,
        segment: String,
    },
    #[error("invalid JSON metadata in {path}: {reason}")]
    InvalidJsonMetadata { path: PathBuf, reason: String },
    #[error("metadata is missing required key '{0}'")]
    MissingKey(String),
    #[error("no .jpg frames in {0}")]
    NoFrames(PathBuf),
    #[error("cannot derive a participant code from '{0}'")]
    InvalidParticipantPath(String),
    #[error("rater name '{name}' {reason}")]
    InvalidRaterName { name: String, reason: &'static str },
    #[error("input closed while waiting for {0}")]
    InputClosed(&'static str),
    #[error("run cancelled")]
    Cancelled,
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LabelError {
    /// Whether the run can continue with the next joke.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, LabelError::InputClosed(_) | LabelError::Cancelled)
    }
}
