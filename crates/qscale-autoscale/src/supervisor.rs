//! Supervisor: runs one scaling loop task per workload.
//!
//! Loops are independent: they share nothing but the shutdown signal.
//! While they run, the supervisor emits a periodic liveness tick.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval};
use tracing::{debug, info, warn};

use crate::scaler::ScalingLoop;

struct LoopSlot {
    workload: String,
    handle: JoinHandle<()>,
}

/// Owns the scaling loop tasks and their shared shutdown channel.
pub struct Supervisor {
    shutdown_tx: watch::Sender<bool>,
    loops: Vec<LoopSlot>,
}

impl Supervisor {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            loops: Vec::new(),
        }
    }

    /// Start `scaling_loop` as its own task. Does not wait for it.
    pub fn spawn(&mut self, scaling_loop: ScalingLoop) {
        let workload = scaling_loop.workload().to_string();
        let shutdown = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(scaling_loop.run(shutdown));

        info!(%workload, "scaling loop spawned");
        self.loops.push(LoopSlot { workload, handle });
    }

    /// Number of spawned loops.
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Number of loops whose task is still running.
    pub fn running(&self) -> usize {
        self.loops.iter().filter(|s| !s.handle.is_finished()).count()
    }

    /// Log a liveness tick every `tick` until `shutdown_signal` resolves,
    /// then stop every loop. A zero `tick` disables the liveness log.
    pub async fn run<F>(self, tick: Duration, shutdown_signal: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = if tick.is_zero() {
            warn!("zero health tick interval, liveness logging disabled");
            None
        } else {
            Some(interval_at(Instant::now() + tick, tick))
        };
        tokio::pin!(shutdown_signal);

        loop {
            tokio::select! {
                _ = next_tick(&mut ticker) => {
                    let running = self.running();
                    if running < self.len() {
                        warn!(running, total = self.len(), "health tick: some scaling loops have exited");
                    } else {
                        info!(running, "health tick");
                    }
                }
                _ = &mut shutdown_signal => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        self.shutdown().await;
    }

    /// Signal every loop to stop and wait for them.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        for slot in self.loops {
            if let Err(e) = slot.handle.await {
                warn!(workload = %slot.workload, error = %e, "scaling loop task failed");
            } else {
                debug!(workload = %slot.workload, "scaling loop stopped");
            }
        }
        info!("all scaling loops stopped");
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
