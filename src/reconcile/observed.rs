//! Observation snapshot types consumed by the reconciliation core.
//!
//! The controller layer fills these in from the Kubernetes API; the core
//! never performs I/O itself. An observer that cannot currently reach a
//! subordinate resource reports it as unobservable rather than failing the
//! pass; only a confirmed not-found counts as absent.

/// Raw observation of one subordinate component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservedComponent {
    /// The resource is confirmed not to exist (the observer got a
    /// definitive not-found answer).
    Absent,
    /// The observer could not reach the resource this pass. Counts as not
    /// ready, but is never evidence that the resource is gone.
    Unobservable,
    /// The resource exists with the given number of ready replicas.
    /// Resources without a replica notion (services) report zero.
    Present {
        /// Ready replica count reported by the resource's own status.
        ready_replicas: i32,
    },
}

/// Raw observations of the three core components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentSnapshot {
    /// JobManager deployment observation.
    pub job_manager_deployment: ObservedComponent,
    /// JobManager service observation.
    pub job_manager_service: ObservedComponent,
    /// TaskManager deployment observation.
    pub task_manager_deployment: ObservedComponent,
}

impl ComponentSnapshot {
    /// A snapshot in which every resource is confirmed to not exist.
    pub fn all_absent() -> Self {
        Self {
            job_manager_deployment: ObservedComponent::Absent,
            job_manager_service: ObservedComponent::Absent,
            task_manager_deployment: ObservedComponent::Absent,
        }
    }

    /// Whether every subordinate resource is confirmed gone, which is the
    /// condition for a stopping cluster to be declared stopped. An
    /// unobservable component is not confirmation; the cluster keeps
    /// stopping until a pass actually sees all three missing.
    pub fn all_absent_now(&self) -> bool {
        self.job_manager_deployment == ObservedComponent::Absent
            && self.job_manager_service == ObservedComponent::Absent
            && self.task_manager_deployment == ObservedComponent::Absent
    }
}

/// Raw observation of the batch job resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservedJob {
    /// The job resource does not exist yet, is pending, or could not be
    /// observed this pass.
    NotFound,
    /// The job is executing.
    Running,
    /// The job completed successfully.
    Succeeded,
    /// The job completed with a failure.
    Failed,
}

/// Everything the core consumes for one pass, taken as a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observations {
    /// Core component observations.
    pub components: ComponentSnapshot,
    /// Job observation; `None` when no job observer ran (session clusters).
    pub job: Option<ObservedJob>,
}
