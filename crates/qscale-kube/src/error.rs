//! Client construction errors.

use thiserror::Error;

/// Failure to build a Kubernetes client. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to read kubeconfig {path}: {reason}")]
    Kubeconfig { path: String, reason: String },

    #[error("failed to infer kubernetes config: {0}")]
    Infer(String),

    #[error("failed to build kubernetes client: {0}")]
    Client(#[from] kube::Error),
}
