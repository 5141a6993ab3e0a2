// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for the predictor widget

use thiserror::Error;

/// Result type alias for predictor operations
pub type Result<T> = std::result::Result<T, PredictorError>;

/// Predictor error types
#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("No file selected")]
    NoFileSelected,

    #[error("Server error! Status: {status}")]
    ServerRejected { status: u16 },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl PredictorError {
    /// True for failures below the application-data level.
    ///
    /// These are shown to the user as one generic connectivity entry; the
    /// cause only goes to the log.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            PredictorError::ServerRejected { .. }
                | PredictorError::Transport(_)
                | PredictorError::MalformedResponse(_)
                | PredictorError::Json(_)
        )
    }
}
