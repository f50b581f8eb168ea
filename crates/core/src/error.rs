//! Error types for accessibility checks

use thiserror::Error;

use crate::orchestrator::violation_message;

/// Result type alias using the axecheck Error
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The controlled test failure: fail-worthy violations were found.
    #[error("{}", violation_message(*count))]
    ViolationsDetected { count: usize },

    #[error("Audit engine has not been injected into the page")]
    EngineNotInjected,

    #[error("Audit engine error: {0}")]
    Engine(String),

    #[error("Violation reporter failed: {0}")]
    Reporter(#[source] anyhow::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether this is the violation-count failure rather than a fault.
    pub fn is_violation_failure(&self) -> bool {
        matches!(self, Error::ViolationsDetected { .. })
    }
}
