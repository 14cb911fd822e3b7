//! qscale-autoscale: backlog-driven replica scaling.
//!
//! One [`ScalingLoop`] runs per workload. Each cycle it measures the queue
//! backlog, consults the [`CooldownGate`], computes a desired replica
//! count and applies it through a [`WorkloadController`].
//!
//! # Scaling Algorithm
//!
//! ```text
//! sleep(poll_interval)
//! backlog = inspector.measure_backlog()       // error → skip cycle
//!
//! if backlog == 0 and !zero_cooldown_passed:  skip
//! if backlog > 0 and !backlog_cooldown_passed: skip
//!
//! desired = clamp(ceil(backlog / messages_per_unit), min, max_replicas)
//!   min   = 0 if zero scaling is allowed, else 1
//!
//! if current == desired: no-op (cooldowns keep running)
//! else: set_replicas(desired) → reset both cooldowns
//! ```
//!
//! A cooldown timer arms itself on its first query, so the first poll
//! after startup (or after a scaling action) never actuates. Cooldown
//! state lives only in memory and starts unarmed on every process start.
//!
//! The [`Supervisor`] spawns one task per loop and fans out a shutdown
//! signal to all of them.

pub mod adapter;
pub mod cooldown;
pub mod error;
pub mod memory;
pub mod policy;
pub mod scaler;
pub mod supervisor;

pub use adapter::{QueueInspector, WorkloadController};
pub use cooldown::{CooldownGate, CooldownTimer};
pub use error::{ControllerError, InspectorError};
pub use policy::desired_replicas;
pub use scaler::{CycleOutcome, ScaleOutcome, ScalingLoop};
pub use supervisor::Supervisor;
