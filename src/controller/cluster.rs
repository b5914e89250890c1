//! FlinkCluster reconciliation driver.
//!
//! Observes the subordinate resources, runs the pure core, persists the new
//! status, and forwards directives. All failure handling for unobservable
//! resources happens here by mapping them to absent or unobservable
//! observations; the core never sees transport errors.

use super::{ControllerContext, ReconcileAction};
use crate::crd::{ClusterState, FlinkCluster};
use crate::error::{OperatorError, OperatorResult};
use crate::naming;
use crate::reconcile::{
    reconcile_pass, ComponentSnapshot, Observations, ObservedComponent, ObservedJob,
};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Service;
use kube::api::{Patch, PatchParams};
use kube::{Api, ResourceExt};
use std::sync::Arc;

/// Controller for FlinkCluster resources.
#[derive(Clone)]
pub struct ClusterController {
    ctx: Arc<ControllerContext>,
}

impl ClusterController {
    /// Create a new cluster controller.
    pub fn new(ctx: Arc<ControllerContext>) -> Self {
        Self { ctx }
    }

    /// Reconcile a FlinkCluster resource.
    ///
    /// One pass: observe, compute, write status if it changed, forward
    /// directives, requeue according to the resulting state.
    pub async fn reconcile(&self, cluster: Arc<FlinkCluster>) -> OperatorResult<ReconcileAction> {
        let name = cluster.name_any();
        let namespace = cluster
            .namespace()
            .ok_or_else(|| OperatorError::ValidationError("cluster must be namespaced".into()))?;

        tracing::info!(
            name = %name,
            namespace = %namespace,
            task_managers = cluster.spec.task_manager.replicas,
            job_cluster = cluster.spec.is_job_cluster(),
            "Reconciling FlinkCluster"
        );

        let components = self.observe_components(&cluster.spec.name, &namespace).await;
        let job = if cluster.spec.is_job_cluster() {
            Some(self.observe_job(&cluster.spec.name, &namespace).await)
        } else {
            None
        };
        let observations = Observations { components, job };

        let outcome = reconcile_pass(
            &cluster.spec,
            cluster.status.as_ref(),
            &observations,
            chrono::Utc::now(),
        )?;

        let changed = match cluster.status.as_ref() {
            Some(previous) => outcome.status.differs_from(previous),
            None => true,
        };
        if changed {
            let clusters: Api<FlinkCluster> = Api::namespaced(self.ctx.client.clone(), &namespace);
            let patch = serde_json::json!({ "status": outcome.status });
            clusters
                .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
                .await?;
            tracing::info!(
                name = %name,
                state = ?outcome.status.state,
                "Cluster status updated"
            );
        }

        for directive in &outcome.directives {
            self.ctx.orchestrator.dispatch(&cluster, *directive);
        }

        Ok(match outcome.status.state {
            ClusterState::Reconciling | ClusterState::Stopping => ReconcileAction::requeue_short(),
            ClusterState::Running if cluster.spec.is_job_cluster() => {
                ReconcileAction::requeue_medium()
            }
            ClusterState::Running => ReconcileAction::requeue_long(),
            ClusterState::Stopped => ReconcileAction::Done,
        })
    }

    /// Observe the three core components.
    ///
    /// An unreachable observer degrades that one component to unobservable;
    /// it never aborts the pass or hides the other components.
    async fn observe_components(&self, cluster_name: &str, namespace: &str) -> ComponentSnapshot {
        let deployments: Api<Deployment> = Api::namespaced(self.ctx.client.clone(), namespace);
        let services: Api<Service> = Api::namespaced(self.ctx.client.clone(), namespace);

        let job_manager_deployment = match deployments
            .get(&naming::job_manager_deployment_name(cluster_name))
            .await
        {
            Ok(deploy) => ObservedComponent::Present {
                ready_replicas: deploy
                    .status
                    .unwrap_or_default()
                    .ready_replicas
                    .unwrap_or(0),
            },
            Err(e) => self.unobserved("JobManager deployment", e),
        };

        let job_manager_service = match services
            .get(&naming::job_manager_service_name(cluster_name))
            .await
        {
            Ok(_) => ObservedComponent::Present { ready_replicas: 0 },
            Err(e) => self.unobserved("JobManager service", e),
        };

        let task_manager_deployment = match deployments
            .get(&naming::task_manager_deployment_name(cluster_name))
            .await
        {
            Ok(deploy) => ObservedComponent::Present {
                ready_replicas: deploy
                    .status
                    .unwrap_or_default()
                    .ready_replicas
                    .unwrap_or(0),
            },
            Err(e) => self.unobserved("TaskManager deployment", e),
        };

        ComponentSnapshot {
            job_manager_deployment,
            job_manager_service,
            task_manager_deployment,
        }
    }

    /// A 404 is a confirmed absence; anything else means the observer could
    /// not see the component this pass, which must never count as the
    /// component being gone.
    fn unobserved(&self, component: &str, err: kube::Error) -> ObservedComponent {
        match err {
            kube::Error::Api(e) if e.code == 404 => ObservedComponent::Absent,
            e => {
                tracing::warn!(component, error = %e, "Component unobservable, treating as not ready");
                ObservedComponent::Unobservable
            }
        }
    }

    /// Observe the batch job resource.
    async fn observe_job(&self, cluster_name: &str, namespace: &str) -> ObservedJob {
        let jobs: Api<Job> = Api::namespaced(self.ctx.client.clone(), namespace);
        match jobs.get(&naming::job_name(cluster_name)).await {
            Ok(job) => {
                let status = job.status.unwrap_or_default();
                let failed = status
                    .conditions
                    .unwrap_or_default()
                    .iter()
                    .any(|c| c.type_ == "Failed" && c.status == "True");
                if status.succeeded.unwrap_or(0) > 0 {
                    ObservedJob::Succeeded
                } else if failed {
                    ObservedJob::Failed
                } else if status.active.unwrap_or(0) > 0 {
                    ObservedJob::Running
                } else {
                    // Exists but has not started a pod yet; submission is
                    // still in flight.
                    ObservedJob::NotFound
                }
            }
            Err(kube::Error::Api(e)) if e.code == 404 => ObservedJob::NotFound,
            Err(e) => {
                tracing::warn!(error = %e, "Job unobservable, treating as unknown");
                ObservedJob::NotFound
            }
        }
    }
}

/// Handle errors during reconciliation.
pub fn error_policy(
    cluster: Arc<FlinkCluster>,
    error: &OperatorError,
    _ctx: Arc<ControllerContext>,
) -> kube::runtime::controller::Action {
    tracing::error!(
        cluster = %cluster.name_any(),
        error = %error,
        "Reconciliation error"
    );
    kube::runtime::controller::Action::requeue(std::time::Duration::from_secs(60))
}
