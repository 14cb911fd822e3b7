//! Configuration error types.

use thiserror::Error;

/// Result type alias for configuration parsing.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while parsing or validating scaling configs.
///
/// All of these are fatal: the daemon refuses to start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config #{index} is not valid JSON: {source}")]
    Json {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("config #{index} ({workload:?}) is invalid: {reason}")]
    Invalid {
        index: usize,
        workload: String,
        reason: String,
    },

    #[error("invalid duration {input:?}: {reason}")]
    Duration { input: String, reason: String },

    #[error("no workload configs given")]
    Empty,
}
