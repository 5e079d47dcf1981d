//! Error types for pdf-outline.

use std::io;
use thiserror::Error;

/// Result type alias for pdf-outline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building an outline.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input or output JSON could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A fragment supplied by the layout provider is structurally invalid.
    #[error("Malformed fragment #{index}: {reason}")]
    MalformedFragment {
        /// Position of the fragment in the provider's stream
        index: usize,
        /// What is wrong with it
        reason: String,
    },

    /// The configuration bundle violates its own ranges.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A detailed-analysis or OCR collaborator failed.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Error during output rendering.
    #[error("Rendering error: {0}")]
    Render(String),

    /// The batch worker pool could not be created.
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// A document worker panicked.
    #[error("Worker panicked while processing {0}")]
    WorkerPanic(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a [`Error::MalformedFragment`].
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Error::MalformedFragment {
            index,
            reason: reason.into(),
        }
    }
}
