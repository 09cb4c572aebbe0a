//! Error types for the agenda-alerts crate.

use thiserror::Error;

/// Failures of an OS notification mechanism. Never fatal to the poller.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The notifier program could not be started.
    #[error("Failed to launch notifier: {0}")]
    Spawn(#[from] std::io::Error),

    /// The notifier ran but reported failure.
    #[error("Notifier exited with status {status:?}")]
    Failed { status: Option<i32> },

    /// The notifier did not finish within its time budget.
    #[error("Notifier timed out after {ms}ms")]
    Timeout { ms: u64 },
}

/// Failures of the rendering/input surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The surface could not be opened; the only fatal presentation error.
    #[error("Failed to open display surface: {0}")]
    Open(String),

    /// Underlying I/O failure while drawing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
