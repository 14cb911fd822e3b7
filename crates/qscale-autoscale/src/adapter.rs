//! Capabilities a scaling loop needs from the outside world.
//!
//! Real adapters live in `qscale-sqs` and `qscale-kube`; deterministic
//! in-memory doubles live in [`crate::memory`]. Adapters are handed to a
//! [`ScalingLoop`](crate::ScalingLoop) at construction and owned by it
//! exclusively.

use async_trait::async_trait;

use crate::error::{ControllerError, InspectorError};

/// Source of the backlog depth for one queue.
#[async_trait]
pub trait QueueInspector: Send + Sync {
    /// Total outstanding messages: visible + delayed + in flight.
    async fn measure_backlog(&self) -> Result<u64, InspectorError>;
}

/// Reads and applies the replica count of one workload.
#[async_trait]
pub trait WorkloadController: Send + Sync {
    /// Replica count currently requested for the workload.
    async fn current_replicas(&self) -> Result<u32, ControllerError>;

    /// Request `replicas` replicas for the workload.
    async fn set_replicas(&self, replicas: u32) -> Result<(), ControllerError>;
}
