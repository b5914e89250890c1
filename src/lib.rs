//! Flink Kubernetes Operator
//!
//! This crate provides a Kubernetes operator for Apache Flink clusters,
//! declared as FlinkCluster custom resources.
//!
//! A cluster comes in two flavors, fixed at creation:
//!
//! - **Session cluster**: long-running; users submit jobs to it out of band.
//! - **Job cluster**: bound to one batch job via `spec.job`; once the job
//!   concludes the cluster tears itself down.
//!
//! The heart of the crate is the pure reconciliation core in [`reconcile`]:
//! per-component readiness aggregation, job lifecycle tracking, and the
//! cluster state machine (`Reconciling -> Running -> Stopping -> Stopped`).
//! The [`controller`] module wires it to the Kubernetes API.
//!
//! # Example
//!
//! ```yaml
//! apiVersion: flinkoperator.k8s.io/v1alpha1
//! kind: FlinkCluster
//! metadata:
//!   name: wordcount
//! spec:
//!   name: wordcount
//!   image:
//!     name: flink:1.8.1
//!   jobManager:
//!     ports:
//!       ui: 8081
//!   taskManager:
//!     replicas: 2
//!   job:
//!     jarFile: /opt/flink/examples/WordCount.jar
//!     restartPolicy: OnFailure
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod crd;
pub mod error;
pub mod naming;
pub mod reconcile;

pub use crd::{FlinkCluster, FlinkClusterSpec, FlinkClusterStatus};
pub use error::{OperatorError, OperatorResult};
