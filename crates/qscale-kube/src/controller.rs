//! Deployment-backed workload controller.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tokio::sync::Mutex;
use tracing::{debug, info};

use qscale_autoscale::{ControllerError, WorkloadController};

use crate::error::ConnectError;

/// Environment variable naming an explicit kubeconfig file.
pub const KUBE_CONFIG_PATH_ENV: &str = "KUBE_CONFIG_PATH";

/// Replica count Kubernetes assumes when `spec.replicas` is unset.
const DEFAULT_REPLICAS: u32 = 1;

/// Build a client from `$KUBE_CONFIG_PATH` if set, otherwise infer
/// (in-cluster service account, then `$KUBECONFIG` / `~/.kube/config`).
pub async fn connect() -> Result<Client, ConnectError> {
    let config = match std::env::var(KUBE_CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => {
            let kubeconfig = Kubeconfig::read_from(&path).map_err(|e| ConnectError::Kubeconfig {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            info!(%path, "using kubeconfig");
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| ConnectError::Kubeconfig {
                    path,
                    reason: e.to_string(),
                })?
        }
        _ => Config::infer()
            .await
            .map_err(|e| ConnectError::Infer(e.to_string()))?,
    };

    Ok(Client::try_from(config)?)
}

/// Scales one Deployment in one namespace.
///
/// `set_replicas` writes back the object seen by the preceding
/// `current_replicas`, so the replace carries that read's
/// `resourceVersion`. A change made in between is rejected by the API
/// server and reported as [`ControllerError::Conflict`].
pub struct DeploymentController {
    api: Api<Deployment>,
    name: String,
    namespace: String,
    last_read: Mutex<Option<Deployment>>,
}

impl DeploymentController {
    pub fn new(client: Client, namespace: &str, name: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            name: name.to_string(),
            namespace: namespace.to_string(),
            last_read: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> Result<Deployment, ControllerError> {
        self.api
            .get(&self.name)
            .await
            .map_err(|e| classify_error(&self.namespace, &self.name, e))
    }
}

#[async_trait]
impl WorkloadController for DeploymentController {
    async fn current_replicas(&self) -> Result<u32, ControllerError> {
        let deployment = self.fetch().await?;
        let replicas = replicas_of(&deployment);
        *self.last_read.lock().await = Some(deployment);
        Ok(replicas)
    }

    async fn set_replicas(&self, replicas: u32) -> Result<(), ControllerError> {
        let cached = self.last_read.lock().await.take();
        let mut deployment = match cached {
            Some(deployment) => deployment,
            None => self.fetch().await?,
        };
        apply_replicas(&mut deployment, replicas);

        self.api
            .replace(&self.name, &PostParams::default(), &deployment)
            .await
            .map_err(|e| classify_error(&self.namespace, &self.name, e))?;

        debug!(namespace = %self.namespace, deployment = %self.name, replicas, "deployment updated");
        Ok(())
    }
}

/// `spec.replicas`, or the Kubernetes default when unset.
fn replicas_of(deployment: &Deployment) -> u32 {
    deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .map(|r| u32::try_from(r).unwrap_or(0))
        .unwrap_or(DEFAULT_REPLICAS)
}

fn apply_replicas(deployment: &mut Deployment, replicas: u32) {
    let spec = deployment.spec.get_or_insert_with(Default::default);
    spec.replicas = Some(i32::try_from(replicas).unwrap_or(i32::MAX));
}

fn classify_error(namespace: &str, name: &str, err: kube::Error) -> ControllerError {
    let target = format!("{namespace}/{name}");
    match err {
        kube::Error::Api(resp) if resp.code == 404 => ControllerError::NotFound(target),
        kube::Error::Api(resp) if resp.code == 409 => ControllerError::Conflict(target),
        other => ControllerError::Api(format!("{target}: {other}")),
    }
}
