//! Scaling loop, one per workload.
//!
//! Polls the queue every `poll_interval`, gates on the cooldown windows,
//! computes the desired replica count and applies it. Every failure is
//! logged and retried on the next poll; the loop only stops when its
//! shutdown signal fires.

use std::future::Future;
use std::time::Duration;

use qscale_config::ScalingConfig;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::adapter::{QueueInspector, WorkloadController};
use crate::cooldown::CooldownGate;
use crate::error::{ControllerError, InspectorError};
use crate::policy::desired_replicas;

/// Result of an actuation attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleOutcome {
    /// The replica count was changed.
    Scaled { from: u32, to: u32 },
    /// Dry-run: the change was computed and logged but not applied.
    DryRun { from: u32, to: u32 },
    /// The workload already runs the desired number of replicas.
    AlreadyAtTarget { replicas: u32 },
}

impl ScaleOutcome {
    /// Whether this outcome restarts the cooldown windows.
    ///
    /// `AlreadyAtTarget` leaves the timers armed: nothing changed, so the
    /// windows keep counting from when they were armed.
    pub fn resets_cooldown(&self) -> bool {
        !matches!(self, ScaleOutcome::AlreadyAtTarget { .. })
    }
}

/// What a single poll cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The queue could not be measured.
    MeasureFailed(InspectorError),
    /// The queue is empty but the zero-scale cooldown has not passed.
    WaitingForZeroCooldown,
    /// The queue has messages but the cooldown has not passed.
    WaitingForCooldown { backlog: u64 },
    /// Actuation was attempted and did not fail.
    Actuated { backlog: u64, outcome: ScaleOutcome },
    /// Actuation failed.
    ActuateFailed { backlog: u64, error: ControllerError },
}

/// Control loop for a single workload.
pub struct ScalingLoop {
    config: ScalingConfig,
    inspector: Box<dyn QueueInspector>,
    controller: Box<dyn WorkloadController>,
    gate: CooldownGate,
    dry_run: bool,
    call_timeout: Option<Duration>,
}

impl ScalingLoop {
    /// Create a loop with fresh (unarmed) cooldown timers.
    pub fn new(
        config: ScalingConfig,
        inspector: Box<dyn QueueInspector>,
        controller: Box<dyn WorkloadController>,
    ) -> Self {
        let gate = CooldownGate::from_config(&config);
        Self {
            config,
            inspector,
            controller,
            gate,
            dry_run: false,
            call_timeout: None,
        }
    }

    /// Compute and log replica changes without applying them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Bound every inspector and controller call.
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn config(&self) -> &ScalingConfig {
        &self.config
    }

    pub fn workload(&self) -> &str {
        &self.config.workload
    }

    pub fn gate(&self) -> &CooldownGate {
        &self.gate
    }

    /// Run one poll → gate → decide → actuate pass (without the sleep).
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let workload = self.config.workload.as_str();

        let backlog = match with_timeout(
            self.call_timeout,
            self.inspector.measure_backlog(),
            InspectorError::Timeout,
        )
        .await
        {
            Ok(n) => n,
            Err(e) => {
                error!(%workload, queue = %self.config.queue, error = %e, "failed to measure queue backlog");
                return CycleOutcome::MeasureFailed(e);
            }
        };

        if backlog == 0 && !self.gate.zero_cooldown_passed() {
            info!(%workload, "queue is empty, waiting for zero-scale cooldown");
            return CycleOutcome::WaitingForZeroCooldown;
        }

        if backlog > 0 && !self.gate.backlog_cooldown_passed() {
            info!(%workload, backlog, "waiting for cooldown period to pass");
            return CycleOutcome::WaitingForCooldown { backlog };
        }

        let desired = desired_replicas(backlog, &self.config);
        debug!(%workload, backlog, desired, "computed desired replicas");

        match self.actuate(desired).await {
            Ok(outcome) => {
                if outcome.resets_cooldown() {
                    self.gate.reset_all();
                }
                CycleOutcome::Actuated { backlog, outcome }
            }
            Err(e) => {
                error!(%workload, desired, error = %e, "failed to scale workload");
                CycleOutcome::ActuateFailed { backlog, error: e }
            }
        }
    }

    async fn actuate(&self, desired: u32) -> Result<ScaleOutcome, ControllerError> {
        let workload = self.config.workload.as_str();

        let current = with_timeout(
            self.call_timeout,
            self.controller.current_replicas(),
            ControllerError::Timeout,
        )
        .await?;

        if current == desired {
            info!(%workload, replicas = current, "already at desired replicas");
            return Ok(ScaleOutcome::AlreadyAtTarget { replicas: current });
        }

        if self.dry_run {
            info!(%workload, from = current, to = desired, "dry run: would scale workload");
            return Ok(ScaleOutcome::DryRun {
                from: current,
                to: desired,
            });
        }

        with_timeout(
            self.call_timeout,
            self.controller.set_replicas(desired),
            ControllerError::Timeout,
        )
        .await?;

        info!(%workload, from = current, to = desired, "scaled workload");
        Ok(ScaleOutcome::Scaled {
            from: current,
            to: desired,
        })
    }

    /// Run the loop until `shutdown` changes (or its sender is dropped).
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let interval = self.config.poll_interval;
        info!(
            workload = %self.config.workload,
            queue = %self.config.queue,
            poll_interval = ?interval,
            dry_run = self.dry_run,
            "scaling loop started"
        );

        if *shutdown.borrow() {
            return;
        }

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    self.run_cycle().await;
                }
                _ = shutdown.changed() => {
                    info!(workload = %self.config.workload, "scaling loop shutting down");
                    break;
                }
            }
        }
    }
}

async fn with_timeout<T, E, F>(
    limit: Option<Duration>,
    fut: F,
    on_timeout: fn(Duration) -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(limit)),
        },
        None => fut.await,
    }
}
