//! Custom Resource Definitions for the Flink operator.
//!
//! - [`FlinkCluster`]: a Flink cluster, either a long-running session cluster
//!   or an ephemeral job cluster bound to a single batch job.

mod cluster;

pub use cluster::{
    ClusterState, ComponentState, ComponentStatus, ComponentsStatus, FlinkCluster,
    FlinkClusterSpec, FlinkClusterStatus, ImagePullPolicy, ImageSpec, JobManagerPorts,
    JobManagerSpec, JobRestartPolicy, JobSpec, JobState, JobStatus, TaskManagerPorts,
    TaskManagerSpec,
};
