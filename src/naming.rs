//! Deterministic names for subordinate resources.
//!
//! Names are derived from `spec.name` only, so status entries identify the
//! same subordinate resource on every pass for the resource's lifetime.

/// Name of the JobManager deployment.
pub fn job_manager_deployment_name(cluster_name: &str) -> String {
    format!("{}-jobmanager", cluster_name)
}

/// Name of the JobManager service.
pub fn job_manager_service_name(cluster_name: &str) -> String {
    format!("{}-jobmanager", cluster_name)
}

/// Name of the TaskManager deployment.
pub fn task_manager_deployment_name(cluster_name: &str) -> String {
    format!("{}-taskmanager", cluster_name)
}

/// Name of the batch job resource.
pub fn job_name(cluster_name: &str) -> String {
    format!("{}-job", cluster_name)
}
