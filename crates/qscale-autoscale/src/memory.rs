//! In-memory adapters.
//!
//! Deterministic stand-ins for a real queue and a real workload, used to
//! drive scaling loops in tests and local experiments. Both are cheap to
//! clone; clones share state, so a test can keep a handle while the loop
//! owns another.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::adapter::{QueueInspector, WorkloadController};
use crate::error::{ControllerError, InspectorError};

/// Queue whose backlog depth is set by hand.
#[derive(Debug, Clone)]
pub struct StaticQueue {
    inner: Arc<Mutex<QueueState>>,
}

#[derive(Debug)]
struct QueueState {
    depth: Result<u64, InspectorError>,
    polls: usize,
}

impl StaticQueue {
    pub fn new(depth: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueueState {
                depth: Ok(depth),
                polls: 0,
            })),
        }
    }

    /// Report `depth` from now on.
    pub async fn set_depth(&self, depth: u64) {
        self.inner.lock().await.depth = Ok(depth);
    }

    /// Fail every measurement with `error` until the next `set_depth`.
    pub async fn fail_with(&self, error: InspectorError) {
        self.inner.lock().await.depth = Err(error);
    }

    /// Number of measurements taken so far.
    pub async fn polls(&self) -> usize {
        self.inner.lock().await.polls
    }
}

#[async_trait]
impl QueueInspector for StaticQueue {
    async fn measure_backlog(&self) -> Result<u64, InspectorError> {
        let mut state = self.inner.lock().await;
        state.polls += 1;
        state.depth.clone()
    }
}

/// Workload that records its replica count in memory.
#[derive(Debug, Clone)]
pub struct InMemoryWorkload {
    inner: Arc<Mutex<WorkloadState>>,
}

#[derive(Debug)]
struct WorkloadState {
    replicas: u32,
    updates: usize,
    update_error: Option<ControllerError>,
}

impl InMemoryWorkload {
    pub fn new(replicas: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WorkloadState {
                replicas,
                updates: 0,
                update_error: None,
            })),
        }
    }

    /// Current replica count.
    pub async fn replicas(&self) -> u32 {
        self.inner.lock().await.replicas
    }

    /// Number of successful `set_replicas` calls.
    pub async fn updates(&self) -> usize {
        self.inner.lock().await.updates
    }

    /// Make every `set_replicas` call fail with `error` (or succeed again
    /// with `None`).
    pub async fn fail_updates_with(&self, error: Option<ControllerError>) {
        self.inner.lock().await.update_error = error;
    }
}

#[async_trait]
impl WorkloadController for InMemoryWorkload {
    async fn current_replicas(&self) -> Result<u32, ControllerError> {
        Ok(self.inner.lock().await.replicas)
    }

    async fn set_replicas(&self, replicas: u32) -> Result<(), ControllerError> {
        let mut state = self.inner.lock().await;
        if let Some(err) = &state.update_error {
            return Err(err.clone());
        }
        state.replicas = replicas;
        state.updates += 1;
        Ok(())
    }
}
