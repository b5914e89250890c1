//! The cluster state machine.
//!
//! Combines core-component readiness and the job assessment with the
//! previous cluster state into the next [`ClusterState`], and emits the
//! directives the orchestration layer acts on. Pure; one invocation per
//! reconciliation pass.

use crate::crd::ClusterState;

use super::job::JobAssessment;

/// Command for the external orchestration layer. The state machine only
/// decides; it never creates or deletes resources itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Submit the cluster's job for the first time.
    SubmitJob,
    /// Recreate the job resource after a failure under `OnFailure`.
    ResubmitJob,
    /// Delete all subordinate resources of a concluding job cluster.
    TearDown,
}

/// Snapshot of everything the transition function consumes.
#[derive(Debug, Clone, Copy)]
pub struct StateInput {
    /// State recorded by the previous pass; `None` on first observation.
    pub previous: Option<ClusterState>,
    /// Aggregate readiness of the three core components.
    pub core_ready: bool,
    /// Whether every subordinate component is observed absent.
    pub all_components_absent: bool,
    /// Job assessment; `Some` iff this is a job cluster.
    pub job: Option<JobAssessment>,
}

/// Compute the next cluster state.
///
/// Ordering rules:
/// - a job cluster whose job has conclusively finished moves to `Stopping`
///   even if a component regressed in the same pass; teardown takes
///   precedence over healing components the cluster no longer needs;
/// - only session clusters regress from `Running` to `Reconciling`;
/// - `Stopped` is claimed only once every component is observed absent.
pub fn next_state(input: &StateInput) -> ClusterState {
    let previous = input.previous.unwrap_or(ClusterState::Reconciling);
    match previous {
        ClusterState::Stopped => ClusterState::Stopped,
        ClusterState::Stopping => {
            if input.all_components_absent {
                ClusterState::Stopped
            } else {
                ClusterState::Stopping
            }
        }
        ClusterState::Running => {
            if input.job.is_some_and(|job| job.terminal) {
                ClusterState::Stopping
            } else if input.core_ready || input.job.is_some() {
                ClusterState::Running
            } else {
                ClusterState::Reconciling
            }
        }
        ClusterState::Reconciling => {
            if input.core_ready {
                ClusterState::Running
            } else {
                ClusterState::Reconciling
            }
        }
    }
}

/// Directives implied by this pass's transition.
pub fn directives(input: &StateInput, next: ClusterState) -> Vec<Directive> {
    let mut out = Vec::new();
    if next == ClusterState::Stopping {
        out.push(Directive::TearDown);
    }
    if next == ClusterState::Running {
        if let Some(job) = input.job {
            if job.state == crate::crd::JobState::Unknown {
                out.push(Directive::SubmitJob);
            } else if job.resubmit {
                out.push(Directive::ResubmitJob);
            }
        }
    }
    out
}
