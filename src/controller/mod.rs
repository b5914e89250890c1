//! Kubernetes controller for FlinkCluster resources.
//!
//! The controller gathers observations from the API server, runs the pure
//! reconciliation core, writes the resulting status back, and hands the
//! core's directives to the orchestration layer.
//!
//! # Usage with kube-runtime
//!
//! ```ignore
//! use flink_operator::controller::{ClusterController, error_policy};
//!
//! Controller::new(clusters, watcher_config)
//!     .run(|cluster, ctx| async move {
//!         let controller = ClusterController::new(ctx.clone());
//!         controller.reconcile(cluster).await
//!     }, error_policy, context)
//!     .for_each(|_| futures::future::ready(()))
//!     .await;
//! ```

mod cluster;

pub use cluster::{error_policy, ClusterController};

use crate::crd::FlinkCluster;
use crate::reconcile::Directive;

/// Consumer of the core's directives.
///
/// Creating, recreating, and deleting subordinate resources is the
/// orchestration layer's job; the controller only forwards what the state
/// machine decided. The default implementation records the decision and
/// nothing else.
pub trait Orchestrator: Send + Sync {
    /// Act on one directive for one cluster.
    fn dispatch(&self, cluster: &FlinkCluster, directive: Directive);
}

/// Orchestrator that only logs the directives it receives.
pub struct LoggingOrchestrator;

impl Orchestrator for LoggingOrchestrator {
    fn dispatch(&self, cluster: &FlinkCluster, directive: Directive) {
        tracing::info!(
            cluster = %cluster.spec.name,
            ?directive,
            "Directive issued"
        );
    }
}

/// Shared context for the controller.
pub struct ControllerContext {
    /// Kubernetes client.
    pub client: kube::Client,
    /// Consumer of teardown/submission directives.
    pub orchestrator: std::sync::Arc<dyn Orchestrator>,
}

impl ControllerContext {
    /// Create a new controller context with the given orchestrator.
    pub fn new(client: kube::Client, orchestrator: std::sync::Arc<dyn Orchestrator>) -> Self {
        Self {
            client,
            orchestrator,
        }
    }
}

/// Result type for reconciliation actions.
#[derive(Debug)]
pub enum ReconcileAction {
    /// Requeue after the specified duration.
    Requeue(std::time::Duration),
    /// Don't requeue; wait for the resource to change.
    Done,
}

impl ReconcileAction {
    /// Requeue after 5 seconds, for states that are expected to move soon.
    pub fn requeue_short() -> Self {
        Self::Requeue(std::time::Duration::from_secs(5))
    }

    /// Requeue after 30 seconds, for polling a running job.
    pub fn requeue_medium() -> Self {
        Self::Requeue(std::time::Duration::from_secs(30))
    }

    /// Requeue after 5 minutes, for steady-state health checking.
    pub fn requeue_long() -> Self {
        Self::Requeue(std::time::Duration::from_secs(300))
    }
}
