//! qscale-kube: Kubernetes Deployment scaling.
//!
//! [`DeploymentController`] reads and writes `spec.replicas` of a single
//! Deployment. A write replaces the object seen by the preceding read, so
//! a concurrent modification surfaces as a conflict instead of being
//! silently overwritten.

pub mod controller;
pub mod error;

pub use controller::{connect, DeploymentController};
pub use error::ConnectError;
