//! Errors reported by queue inspectors and workload controllers.
//!
//! Both kinds are transient: the scaling loop logs them and retries on
//! the next poll without touching cooldown state.

use std::time::Duration;

use thiserror::Error;

/// Failure to measure the queue backlog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectorError {
    #[error("queue request failed: {0}")]
    Request(String),

    #[error("queue attribute {0} missing from response")]
    MissingAttribute(String),

    #[error("queue attribute {name} has non-integer value {value:?}")]
    InvalidAttribute { name: String, value: String },

    #[error("queue measurement timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure to read or apply a workload's replica count.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("workload not found: {0}")]
    NotFound(String),

    #[error("conflicting update to workload {0}")]
    Conflict(String),

    #[error("workload api error: {0}")]
    Api(String),

    #[error("workload call timed out after {0:?}")]
    Timeout(Duration),
}
