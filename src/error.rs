use std::path::PathBuf;

use thiserror::Error;

/// Failures from the relational store and blob tree.
///
/// Benign conditions (a lookup that finds nothing, a duplicate fingerprint
/// spotted before processing) are modeled as values by the callers; these
/// variants are for operations that genuinely could not complete.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a conversation with this fingerprint already exists")]
    FingerprintExists,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures from the transcription collaborator.
///
/// `Processing` is a terminal error reported by the service itself; it is
/// fatal for the current operation and never retried automatically.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("transcription service reported an error: {0}")]
    Processing(String),

    #[error("transcription did not finish within {0} seconds")]
    Timeout(u64),

    #[error("unexpected response from transcription service: {0}")]
    Protocol(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures from the segmentation pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("unsupported audio format: .{0}")]
    UnsupportedFormat(String),

    #[error("audio conversion failed: {0}")]
    Convert(String),

    #[error(transparent)]
    Codec(#[from] hound::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to read {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },
}
