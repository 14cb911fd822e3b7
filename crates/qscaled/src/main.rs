//! qscaled: the qscale daemon.
//!
//! Runs one scaling loop per configured Deployment, each polling its own
//! SQS queue and adjusting the Deployment's replica count.
//!
//! # Usage
//!
//! ```text
//! qscaled --kubernetes-namespace jobs --aws-region us-east-1 --dry-run false \
//!   --config '{"pollInterval":"5s","coolDownPeriod":"300s","messagePerPod":100,
//!              "maxPods":10,"zeroScaling":false,"zeroScalingCoolDown":"300s",
//!              "queueName":"jobs","deploymentName":"worker"}'
//! ```

mod daemon;

use std::time::Duration;

use clap::{ArgAction, Parser};

use daemon::ProcessConfig;
use qscale_config::{parse_config_flags, ScalingConfig};

#[derive(Parser, Debug)]
#[command(name = "qscaled", about = "Scale Kubernetes deployments on SQS queue depth")]
struct Cli {
    /// Workload config as a JSON object. Repeat once per deployment.
    #[arg(long = "config", value_name = "JSON", required = true)]
    configs: Vec<String>,

    /// Namespace the deployments run in.
    #[arg(long, default_value = "default")]
    kubernetes_namespace: String,

    /// AWS region of the queues. Falls back to the default AWS config.
    #[arg(long)]
    aws_region: Option<String>,

    /// Log replica changes instead of applying them.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    dry_run: bool,

    /// Override the SQS endpoint (e.g. a local ElasticMQ).
    #[arg(long)]
    sqs_endpoint: Option<String>,

    /// Seconds between liveness log lines.
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    health_tick_secs: u64,

    /// Per-call timeout for queue and Kubernetes requests, in seconds.
    #[arg(long)]
    call_timeout_secs: Option<u64>,
}

impl Cli {
    /// Validate every workload config and split out the process settings.
    fn into_parts(self) -> anyhow::Result<(Vec<ScalingConfig>, ProcessConfig)> {
        let configs = parse_config_flags(&self.configs)?;

        let process = ProcessConfig {
            namespace: self.kubernetes_namespace,
            region: self.aws_region.filter(|r| !r.is_empty()),
            sqs_endpoint: self.sqs_endpoint.filter(|e| !e.is_empty()),
            dry_run: self.dry_run,
            health_tick: Duration::from_secs(self.health_tick_secs),
            call_timeout: self
                .call_timeout_secs
                .filter(|&s| s > 0)
                .map(Duration::from_secs),
        };

        Ok((configs, process))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,qscaled=debug,qscale=debug")),
        )
        .init();

    let cli = Cli::parse();
    let (configs, process) = cli.into_parts()?;

    daemon::run(configs, process).await
}
