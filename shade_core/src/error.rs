use thiserror::Error;

/// Why an in-flight calibration phase was discarded.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    #[error("stall")]
    Stall,
    #[error("stopped")]
    Stopped,
}

#[derive(Debug, Error, Clone)]
pub enum ShadeError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("motor stalled")]
    Stall,
    #[error("calibration aborted: {0}")]
    CalibrationAborted(AbortReason),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing motion engine")]
    MissingEngine,
    #[error("missing storage backend")]
    MissingStore,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
