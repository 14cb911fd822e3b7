//! Per-workload scaling configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// Scaling parameters for a single workload.
///
/// Immutable once validated; each scaling loop receives its own copy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScalingConfig {
    /// How often the queue is polled.
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub poll_interval: Duration,

    /// Minimum time between scaling actions while the queue has messages.
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub cool_down_period: Duration,

    /// Backlog messages absorbed by one replica.
    #[serde(rename = "messagePerPod")]
    pub messages_per_unit: u64,

    /// Upper replica bound.
    #[serde(rename = "maxPods")]
    pub max_replicas: u32,

    /// Whether the workload may be scaled down to zero replicas.
    #[serde(rename = "zeroScaling")]
    pub allow_zero_replicas: bool,

    /// Minimum time between scaling actions while the queue is empty.
    #[serde(deserialize_with = "crate::duration::deserialize")]
    pub zero_scaling_cool_down: Duration,

    /// Queue name (or full queue URL) to measure.
    #[serde(rename = "queueName", alias = "sqsQueueUrl", alias = "queueIdentifier")]
    pub queue: String,

    /// Name of the Deployment to scale.
    #[serde(rename = "deploymentName")]
    pub workload: String,
}

impl ScalingConfig {
    /// Parse and validate a single JSON config. `index` is only used for
    /// error messages.
    pub fn from_json(index: usize, raw: &str) -> ConfigResult<Self> {
        let config: ScalingConfig = serde_json::from_str(raw)
            .map_err(|source| ConfigError::Json { index, source })?;
        config.validate(index)?;
        Ok(config)
    }

    /// Lowest replica count the policy may choose.
    pub fn min_replicas(&self) -> u32 {
        if self.allow_zero_replicas { 0 } else { 1 }
    }

    /// Check structural validity.
    pub fn validate(&self, index: usize) -> ConfigResult<()> {
        let invalid = |reason: &str| ConfigError::Invalid {
            index,
            workload: self.workload.clone(),
            reason: reason.to_string(),
        };

        if self.messages_per_unit == 0 {
            return Err(invalid("messagePerPod must be greater than 0"));
        }
        if self.max_replicas <= 1 {
            return Err(invalid("maxPods must be greater than 1"));
        }
        if self.queue.trim().is_empty() {
            return Err(invalid("queueName must not be empty"));
        }
        if self.workload.trim().is_empty() {
            return Err(invalid("deploymentName must not be empty"));
        }
        if self.poll_interval.is_zero() {
            return Err(invalid("pollInterval must be greater than 0"));
        }
        if self.cool_down_period.is_zero() {
            return Err(invalid("coolDownPeriod must be greater than 0"));
        }
        if self.zero_scaling_cool_down.is_zero() {
            return Err(invalid("zeroScalingCoolDown must be greater than 0"));
        }
        Ok(())
    }
}

/// Parse every `--config` value. Fails on the first bad entry.
pub fn parse_config_flags<S: AsRef<str>>(values: &[S]) -> ConfigResult<Vec<ScalingConfig>> {
    if values.is_empty() {
        return Err(ConfigError::Empty);
    }

    values
        .iter()
        .enumerate()
        .map(|(index, raw)| ScalingConfig::from_json(index, raw.as_ref()))
        .collect()
}
