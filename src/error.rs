//! Error types for Apiary
//!
//! A closed error taxonomy covering every failure mode the engine can report.
//! Uses thiserror for ergonomic error handling. Background task outcomes are
//! never surfaced here; they are recorded on the task record and read back
//! through monitoring.

use thiserror::Error;

/// Result type alias for Apiary operations
pub type Result<T> = std::result::Result<T, ApiaryError>;

/// Error taxonomy for engine operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiaryError {
    /// Malformed or out-of-range input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown swarm/agent/task reference, or no eligible agents for a task
    #[error("Not found: {0}")]
    NotFound(String),

    /// Agent-count or memory-budget exceeded
    #[error("Capacity exceeded: {0}")]
    Capacity(String),

    /// Duplicate swarm name
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Operation invalid for the current entity state
    #[error("Invalid state: {0}")]
    State(String),
}

impl ApiaryError {
    /// Stable machine-readable code for the uniform result envelope
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Capacity(_) => "CAPACITY_EXCEEDED",
            Self::Conflict(_) => "CONFLICT",
            Self::State(_) => "INVALID_STATE",
        }
    }
}
