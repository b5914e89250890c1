//! FlinkCluster Custom Resource Definition.
//!
//! Defines a Flink cluster deployment in Kubernetes. A cluster with a `job`
//! spec is an ephemeral job cluster that tears itself down once the job
//! finishes; a cluster without one is a long-running session cluster.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{OperatorError, OperatorResult};

/// FlinkCluster is the Schema for the flinkclusters API.
///
/// The operator watches FlinkCluster resources and drives the subordinate
/// resources (JobManager deployment, JobManager service, TaskManager
/// deployment and, for job clusters, a batch job) toward the desired state,
/// recording the observed state back into [`FlinkClusterStatus`].
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "flinkoperator.k8s.io",
    version = "v1alpha1",
    kind = "FlinkCluster",
    plural = "flinkclusters",
    shortname = "fc",
    namespaced,
    status = "FlinkClusterStatus",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"TaskManagers", "type":"integer", "jsonPath":".spec.taskManager.replicas"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct FlinkClusterSpec {
    /// The name of the Flink cluster. Subordinate resource names are derived
    /// from it, so it is fixed for the resource's lifetime.
    pub name: String,

    /// Flink image for the cluster's components.
    pub image: ImageSpec,

    /// JobManager topology.
    pub job_manager: JobManagerSpec,

    /// TaskManager topology.
    pub task_manager: TaskManagerSpec,

    /// Optional job spec. If specified, this cluster is an ephemeral job
    /// cluster, which is automatically terminated after the job finishes;
    /// otherwise, it is a long-running session cluster. The classification
    /// is permanent: adding or removing `job` after creation is rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<JobSpec>,
}

impl FlinkClusterSpec {
    /// Whether this spec describes an ephemeral job cluster.
    pub fn is_job_cluster(&self) -> bool {
        self.job.is_some()
    }

    /// Validate the spec before any status computation.
    ///
    /// An invalid spec never reaches the state machine.
    pub fn validate(&self) -> OperatorResult<()> {
        if self.name.is_empty() {
            return Err(OperatorError::ValidationError(
                "spec.name must not be empty".into(),
            ));
        }
        if self.image.name.is_empty() {
            return Err(OperatorError::ValidationError(
                "spec.image.name must not be empty".into(),
            ));
        }
        if let Some(replicas) = self.job_manager.replicas {
            if replicas < 0 {
                return Err(OperatorError::ValidationError(
                    "spec.jobManager.replicas must not be negative".into(),
                ));
            }
        }
        if self.task_manager.replicas < 0 {
            return Err(OperatorError::ValidationError(
                "spec.taskManager.replicas must not be negative".into(),
            ));
        }
        if let Some(job) = &self.job {
            if job.jar_file.is_empty() {
                return Err(OperatorError::ValidationError(
                    "spec.job.jarFile must not be empty".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Flink image of the JobManager and TaskManager containers.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    /// Flink image name.
    pub name: String,

    /// Flink image pull policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_policy: Option<ImagePullPolicy>,
}

/// Image pull policy for cluster containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ImagePullPolicy {
    /// Always pull the image.
    Always,
    /// Pull the image only when not present on the node.
    IfNotPresent,
    /// Never pull the image.
    Never,
}

/// JobManager properties.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobManagerSpec {
    /// The number of JobManager replicas. Defaults to 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// JobManager ports.
    #[serde(default)]
    pub ports: JobManagerPorts,
}

impl JobManagerSpec {
    /// Replica target with the default applied, so the state machine always
    /// operates on a resolved value.
    pub fn replicas_or_default(&self) -> i32 {
        self.replicas.unwrap_or(1)
    }
}

/// Ports of the JobManager.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobManagerPorts {
    /// RPC port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc: Option<i32>,

    /// Blob port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob: Option<i32>,

    /// Query port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<i32>,

    /// UI port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui: Option<i32>,
}

/// TaskManager properties.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskManagerSpec {
    /// The number of TaskManager replicas.
    pub replicas: i32,

    /// TaskManager ports.
    #[serde(default)]
    pub ports: TaskManagerPorts,
}

/// Ports of the TaskManager.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskManagerPorts {
    /// Data port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<i32>,

    /// RPC port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc: Option<i32>,

    /// Query port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<i32>,
}

/// Properties of the batch job bound to a job cluster.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    /// JAR file of the job.
    pub jar_file: String,

    /// Fully qualified Java class name of the job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    /// Args of the job.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Savepoint to restore the job from (e.g., gs://my-savepoint/1234).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savepoint: Option<String>,

    /// Allow non-restored state when restoring from the savepoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_non_restored_state: Option<bool>,

    /// Job parallelism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<i32>,

    /// No logging output to STDOUT.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_logging_to_stdout: Option<bool>,

    /// Restart policy applied when the job fails.
    pub restart_policy: JobRestartPolicy,
}

/// Policy for restarting a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum JobRestartPolicy {
    /// Resubmit the job whenever it is observed to have failed.
    OnFailure,
    /// Never resubmit; a failed job is terminal.
    Never,
}

/// Overall state of a Flink cluster.
///
/// Ordered lifecycle `Reconciling -> Running -> Stopping -> Stopped`. Session
/// clusters may regress from `Running` to `Reconciling` while a component is
/// restored; job clusters only move forward once their job concludes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ClusterState {
    /// Components are being created or restored.
    #[default]
    Reconciling,
    /// All core components are ready.
    Running,
    /// Job finished; subordinate resources are being torn down.
    Stopping,
    /// All subordinate resources are gone. Terminal, job clusters only.
    Stopped,
}

/// Readiness of one subordinate component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ComponentState {
    /// The component is absent or below its readiness target.
    #[default]
    NotReady,
    /// The component exists and meets its readiness target.
    Ready,
}

/// Execution state of the cluster's batch job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum JobState {
    /// The job is executing.
    Running,
    /// The job completed successfully.
    Succeeded,
    /// The job failed.
    Failed,
    /// The job resource cannot currently be observed.
    #[default]
    Unknown,
}

/// Observed status of one subordinate component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    /// The resource name of the component.
    pub name: String,

    /// The state of the component.
    pub state: ComponentState,
}

/// Observed status of the cluster's subordinate components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentsStatus {
    /// The state of the JobManager deployment.
    pub job_manager_deployment: ComponentStatus,

    /// The state of the JobManager service.
    pub job_manager_service: ComponentStatus,

    /// The state of the TaskManager deployment.
    pub task_manager_deployment: ComponentStatus,
}

/// Observed status of the cluster's batch job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    /// The name of the job resource.
    pub name: String,

    /// The state of the job.
    pub state: JobState,
}

/// FlinkCluster status. Rebuilt wholesale on every reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlinkClusterStatus {
    /// The overall state of the Flink cluster.
    #[serde(default)]
    pub state: ClusterState,

    /// The status of the components.
    pub components: ComponentsStatus,

    /// The status of the (optional) job. Present iff `spec.job` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<JobStatus>,

    /// Last time this status changed, RFC 3339. Untouched when a pass
    /// recomputes an identical status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,
}

impl FlinkClusterStatus {
    /// Whether two statuses differ in anything but the update timestamp.
    pub fn differs_from(&self, other: &FlinkClusterStatus) -> bool {
        self.state != other.state
            || self.components != other.components
            || self.job != other.job
    }
}
