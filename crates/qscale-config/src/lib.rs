//! qscale-config: per-workload scaling configuration.
//!
//! Each tracked workload is described by one JSON object passed on the
//! command line:
//!
//! ```text
//! --config '{"pollInterval":"5s","coolDownPeriod":"300s","messagePerPod":100,
//!            "maxPods":10,"zeroScaling":false,"zeroScalingCoolDown":"300s",
//!            "queueName":"jobs","deploymentName":"worker"}'
//! ```
//!
//! Durations accept either a number of nanoseconds or a Go-style duration
//! string (`"500ms"`, `"1m30s"`). Every config is validated before any
//! scaling loop starts; a single bad config aborts startup.

pub mod duration;
pub mod error;
pub mod scaling;

pub use duration::parse_duration;
pub use error::{ConfigError, ConfigResult};
pub use scaling::{parse_config_flags, ScalingConfig};
