//! End-to-end scaling scenarios.
//!
//! Each test runs a real `ScalingLoop` task against in-memory adapters
//! under a paused tokio clock, so cooldown windows elapse instantly and
//! deterministically.

use std::time::Duration;

use qscale_autoscale::memory::{InMemoryWorkload, StaticQueue};
use qscale_autoscale::{CycleOutcome, ScaleOutcome, ScalingLoop, Supervisor};
use qscale_config::ScalingConfig;
use tokio::sync::watch;
use tokio::time::sleep;

fn scaler_config(cool_down: Duration) -> ScalingConfig {
    ScalingConfig {
        poll_interval: Duration::from_secs(1),
        cool_down_period: cool_down,
        messages_per_unit: 20,
        max_replicas: 100,
        allow_zero_replicas: false,
        zero_scaling_cool_down: Duration::from_secs(20),
        queue: "example-queue".to_string(),
        workload: "deploy".to_string(),
    }
}

/// Spawn a loop and return the handles a test needs to drive and observe it.
fn start(
    cool_down: Duration,
    backlog: u64,
    replicas: u32,
) -> (StaticQueue, InMemoryWorkload, watch::Sender<bool>) {
    let queue = StaticQueue::new(backlog);
    let workload = InMemoryWorkload::new(replicas);
    let scaler = ScalingLoop::new(
        scaler_config(cool_down),
        Box::new(queue.clone()),
        Box::new(workload.clone()),
    );

    let (tx, rx) = watch::channel(false);
    tokio::spawn(scaler.run(rx));
    (queue, workload, tx)
}

#[tokio::test(start_paused = true)]
async fn scale_up_waits_for_cooldown() {
    let (_queue, workload, _tx) = start(Duration::from_secs(5), 100, 3);

    sleep(Duration::from_millis(3500)).await;
    assert_eq!(workload.replicas().await, 3, "replicas should be 3 before the cooldown period");

    sleep(Duration::from_secs(5)).await;
    assert_eq!(workload.replicas().await, 5, "replicas should be 5 after the cooldown period");
}

#[tokio::test(start_paused = true)]
async fn scale_down_waits_for_cooldown() {
    let (_queue, workload, _tx) = start(Duration::from_secs(5), 3, 3);

    sleep(Duration::from_millis(3500)).await;
    assert_eq!(workload.replicas().await, 3, "replicas should be 3 before the cooldown period");

    sleep(Duration::from_secs(5)).await;
    assert_eq!(workload.replicas().await, 1, "replicas should be 1 after the cooldown period");
}

#[tokio::test(start_paused = true)]
async fn reaches_minimum_replicas() {
    let (_queue, workload, _tx) = start(Duration::from_secs(1), 3, 3);

    sleep(Duration::from_millis(3500)).await;
    assert_eq!(workload.replicas().await, 1);
}

#[tokio::test(start_paused = true)]
async fn clamps_to_max_replicas() {
    let (_queue, workload, _tx) = start(Duration::from_secs(1), 15000, 3);

    sleep(Duration::from_millis(3500)).await;
    assert_eq!(workload.replicas().await, 100);
}

#[tokio::test(start_paused = true)]
async fn follows_backlog_changes() {
    let (queue, workload, _tx) = start(Duration::from_secs(1), 100, 3);

    sleep(Duration::from_millis(2500)).await;
    assert_eq!(workload.replicas().await, 5);

    // Cooldown re-arms at t=3 and passes at t=4.
    queue.set_depth(401).await;
    sleep(Duration::from_secs(2)).await;
    assert_eq!(workload.replicas().await, 21);
    assert_eq!(workload.updates().await, 2);
}

#[tokio::test(start_paused = true)]
async fn unchanged_count_is_never_written() {
    let (_queue, workload, _tx) = start(Duration::from_secs(1), 60, 3);

    sleep(Duration::from_secs(20)).await;
    assert_eq!(workload.replicas().await, 3);
    assert_eq!(workload.updates().await, 0);
}

#[tokio::test(start_paused = true)]
async fn dry_run_never_mutates_workload() {
    let queue = StaticQueue::new(100);
    let workload = InMemoryWorkload::new(3);
    let mut scaler = ScalingLoop::new(
        scaler_config(Duration::from_secs(1)),
        Box::new(queue.clone()),
        Box::new(workload.clone()),
    )
    .with_dry_run(true);

    for depth in [100, 400, 5000, 3] {
        queue.set_depth(depth).await;

        // Arms the (freshly reset) cooldown.
        assert!(matches!(
            scaler.run_cycle().await,
            CycleOutcome::WaitingForCooldown { .. }
        ));

        sleep(Duration::from_secs(1)).await;
        let outcome = scaler.run_cycle().await;
        assert!(
            matches!(
                outcome,
                CycleOutcome::Actuated { outcome: ScaleOutcome::DryRun { from: 3, .. }, .. }
            ),
            "depth {depth}: {outcome:?}"
        );
        assert!(!scaler.gate().backlog().is_armed());
    }

    assert_eq!(workload.replicas().await, 3);
    assert_eq!(workload.updates().await, 0);
}

#[tokio::test(start_paused = true)]
async fn measurement_outage_is_retried() {
    let (queue, workload, _tx) = start(Duration::from_secs(1), 100, 3);
    queue
        .fail_with(qscale_autoscale::InspectorError::Request("throttled".into()))
        .await;

    sleep(Duration::from_millis(5500)).await;
    assert_eq!(workload.replicas().await, 3);

    queue.set_depth(100).await;
    sleep(Duration::from_secs(2)).await;
    assert_eq!(workload.replicas().await, 5);
}

#[tokio::test(start_paused = true)]
async fn supervisor_drives_many_workloads() {
    let mut supervisor = Supervisor::new();
    let mut handles = Vec::new();

    for (i, depth) in [20u64, 45, 5000].into_iter().enumerate() {
        let mut config = scaler_config(Duration::from_secs(1));
        config.workload = format!("deploy-{i}");
        let queue = StaticQueue::new(depth);
        let workload = InMemoryWorkload::new(3);
        supervisor.spawn(ScalingLoop::new(
            config,
            Box::new(queue),
            Box::new(workload.clone()),
        ));
        handles.push(workload);
    }

    sleep(Duration::from_millis(2500)).await;
    assert_eq!(handles[0].replicas().await, 1);
    assert_eq!(handles[1].replicas().await, 3);
    assert_eq!(handles[2].replicas().await, 100);
    assert_eq!(handles[1].updates().await, 0);

    supervisor.shutdown().await;
}
