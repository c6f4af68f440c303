use std::time::Duration;
use thiserror::Error;
use vmcore::audio::AudioError;

/// Failures at the boundary with the host's object graph.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("host target not found: {0}")]
    MissingTarget(String),

    #[error("method '{method}' not found on '{target}'")]
    MissingMethod { target: String, method: String },

    #[error("host rejected patch: {0}")]
    PatchRejected(String),

    #[error("host operation failed: {0}")]
    Operation(String),
}

/// Why an attachment could not be turned into a voice message.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("audio analysis failed: {0}")]
    Audio(#[from] AudioError),

    #[error("reading audio timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization/deserialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
