//! Daemon wiring: build adapters, spawn scaling loops, wait for shutdown.

use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use qscale_autoscale::{ScalingLoop, Supervisor};
use qscale_config::ScalingConfig;
use qscale_kube::DeploymentController;
use qscale_sqs::SqsInspector;

/// Settings shared by every scaling loop in the process.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub namespace: String,
    pub region: Option<String>,
    pub sqs_endpoint: Option<String>,
    pub dry_run: bool,
    pub health_tick: Duration,
    pub call_timeout: Option<Duration>,
}

/// Run until Ctrl-C or SIGTERM.
pub async fn run(configs: Vec<ScalingConfig>, process: ProcessConfig) -> anyhow::Result<()> {
    info!(
        workloads = configs.len(),
        namespace = %process.namespace,
        dry_run = process.dry_run,
        "qscaled starting"
    );

    let kube = qscale_kube::connect()
        .await
        .context("failed to configure kubernetes client")?;
    let sqs = qscale_sqs::connect(process.region.as_deref(), process.sqs_endpoint.as_deref()).await;

    let mut supervisor = Supervisor::new();
    for config in configs {
        info!(
            workload = %config.workload,
            queue = %config.queue,
            max_replicas = config.max_replicas,
            messages_per_replica = config.messages_per_unit,
            "starting autoscaler"
        );

        let inspector = SqsInspector::new(sqs.clone(), config.queue.clone());
        let controller = DeploymentController::new(kube.clone(), &process.namespace, &config.workload);
        let scaling_loop = ScalingLoop::new(config, Box::new(inspector), Box::new(controller))
            .with_dry_run(process.dry_run)
            .with_call_timeout(process.call_timeout);

        supervisor.spawn(scaling_loop);
    }

    supervisor.run(process.health_tick, shutdown_signal()).await;

    info!("qscaled stopped");
    Ok(())
}

/// Resolves on Ctrl-C or (on unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl-C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
