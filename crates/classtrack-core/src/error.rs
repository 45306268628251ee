//! Error type shared across the workspace.

use thiserror::Error;

/// All the ways a ClassTrack operation can fail.
#[derive(Debug, Error)]
pub enum ClassTrackError {
    /// The record store rejected or failed an operation.
    #[error("store error: {0}")]
    Store(String),

    /// A messaging-channel call failed.
    #[error("channel error: {0}")]
    Channel(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClassTrackError>;
