//! Error taxonomy shared by every fleet operation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures surfaced by the fleet core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FleetError {
    /// External API/CLI call failed, timed out, or returned malformed data
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Referenced cluster, node group or context does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Target of a create/attach operation already exists
    #[error("conflict: {0}")]
    Conflict(String),

    /// Requested change would break an invariant
    #[error("invalid state: {0}")]
    InvalidState(String),
}

pub type FleetResult<T> = Result<T, FleetError>;

/// Stable machine-readable code for each error class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    UpstreamUnavailable,
    NotFound,
    Conflict,
    InvalidState,
}

impl FleetError {
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            FleetError::UpstreamUnavailable(_) => ErrorCode::UpstreamUnavailable,
            FleetError::NotFound(_) => ErrorCode::NotFound,
            FleetError::Conflict(_) => ErrorCode::Conflict,
            FleetError::InvalidState(_) => ErrorCode::InvalidState,
        }
    }

    /// The message without the class prefix
    pub fn detail(&self) -> &str {
        match self {
            FleetError::UpstreamUnavailable(m)
            | FleetError::NotFound(m)
            | FleetError::Conflict(m)
            | FleetError::InvalidState(m) => m,
        }
    }
}

impl From<serde_json::Error> for FleetError {
    fn from(err: serde_json::Error) -> Self {
        FleetError::UpstreamUnavailable(format!("malformed upstream output: {}", err))
    }
}
