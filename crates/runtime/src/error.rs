//! Error types for the embedding layer.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the embedded engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Engine setup failed. Fatal to the host session.
    #[error("Engine initialization failed: {0}")]
    Initialization(String),

    /// The engine refused to create a browser.
    #[error("Browser creation failed: {0}")]
    BrowserCreation(String),

    /// The browser has no main frame right now (e.g. mid-teardown).
    #[error("No main frame available for browser {browser_id}")]
    NoFrame { browser_id: i32 },

    /// Operation attempted in a state that forbids it.
    #[error("Invalid state: cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    /// A token was released twice, used after release, or used as the wrong kind.
    #[error("Reference count misuse: {0}")]
    RefcountMisuse(String),

    /// A null native handle was passed where an object is required.
    #[error("Null {kind} handle")]
    NullHandle { kind: &'static str },

    /// No engine has been attached to the process.
    #[error("No engine attached")]
    EngineMissing,

    /// Invalid argument provided to an operation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Builds an [`Error::InvalidState`] from an operation label and the current state.
    pub fn invalid_state(operation: &'static str, state: impl ToString) -> Self {
        Error::InvalidState {
            operation,
            state: state.to_string(),
        }
    }

    /// Returns true if the caller may retry (after a pump, or with other parameters).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::BrowserCreation(_) | Error::NoFrame { .. })
    }

    /// Returns true if continuing would run on corrupted ownership state or a
    /// failed engine.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Initialization(_) | Error::RefcountMisuse(_))
    }

    /// Returns true if this is an invalid state error.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Error::InvalidState { .. })
    }

    /// Status code reported across the C boundary. Always negative.
    pub fn status_code(&self) -> i32 {
        match self {
            Error::Initialization(_) => -1,
            Error::BrowserCreation(_) => -2,
            Error::NoFrame { .. } => -3,
            Error::InvalidState { .. } => -4,
            Error::NullHandle { .. } | Error::InvalidArgument(_) => -5,
            Error::RefcountMisuse(_) | Error::EngineMissing | Error::Io(_) | Error::Json(_) => -6,
        }
    }
}
