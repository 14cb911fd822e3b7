//! Replica policy: backlog depth → desired replica count.

use qscale_config::ScalingConfig;
use tracing::debug;

/// Desired replica count for `backlog` outstanding messages.
///
/// `ceil(backlog / messages_per_unit)`, clamped to
/// `[config.min_replicas(), config.max_replicas]`. The division is done in
/// floating point so any remainder rounds up.
pub fn desired_replicas(backlog: u64, config: &ScalingConfig) -> u32 {
    let raw = (backlog as f64 / config.messages_per_unit as f64).ceil();
    let min = config.min_replicas();
    let max = config.max_replicas;

    if raw < f64::from(min) {
        debug!(
            workload = %config.workload,
            min,
            desired = raw,
            "desired replicas below minimum, using minimum"
        );
        min
    } else if raw > f64::from(max) {
        debug!(
            workload = %config.workload,
            max,
            desired = raw,
            "desired replicas above maximum, using maximum"
        );
        max
    } else {
        raw as u32
    }
}
