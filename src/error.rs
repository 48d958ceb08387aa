//! Typed errors threaded through the engine.
//!
//! Grounded on the teacher's `IpcError`/`AutomotiveError` pattern: a
//! `thiserror`-derived enum at the module seam, with `anyhow::Result` only
//! at the application boundary in `main.rs`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("socket setup failed: {0}")]
    SocketSetup(String),

    #[error("calibration did not converge: {0}")]
    CalibrationExhausted(String),

    #[error("daemon closed the control connection")]
    DaemonDisconnected,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The C3 contract's three-way failure class for a single train attempt.
///
/// Kept distinct from `EngineError` because callers treat it as control
/// flow (retry, back off, overload) rather than a propagating failure.
#[derive(Debug)]
pub enum TrainFailure {
    StaleTrain,
    Incomplete,
    Fatal(EngineError),
}

impl std::fmt::Display for TrainFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrainFailure::StaleTrain => write!(f, "stale train"),
            TrainFailure::Incomplete => write!(f, "incomplete train"),
            TrainFailure::Fatal(e) => write!(f, "fatal: {e}"),
        }
    }
}

impl From<std::io::Error> for TrainFailure {
    fn from(e: std::io::Error) -> Self {
        TrainFailure::Fatal(EngineError::Io(e))
    }
}
