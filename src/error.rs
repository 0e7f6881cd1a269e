//! Error types for engagelink

use thiserror::Error;

/// Errors that can occur in the capture and relay pipeline
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Media acquisition failed: {0}")]
    Acquisition(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Frame encoding error: {0}")]
    FrameEncoding(String),

    #[error("Pose estimator error: {0}")]
    Estimator(String),

    #[error("Invalid session code: {0}")]
    InvalidCode(String),

    #[error("Channel is not connected")]
    NotConnected,

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}
