//! Job status tracking.
//!
//! Maps the raw job observation to a [`JobState`] and decides whether the
//! job should be resubmitted under the spec's restart policy. Applies only
//! to job clusters.

use crate::crd::{JobRestartPolicy, JobSpec, JobState};

use super::observed::ObservedJob;

/// Job lifecycle assessment for one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobAssessment {
    /// Computed job state.
    pub state: JobState,
    /// Whether the orchestration layer should resubmit the job this pass.
    /// Recomputed every pass; stays true while a failed OnFailure job has
    /// not yet been observed running again.
    pub resubmit: bool,
    /// Whether the job has conclusively finished for this resource's
    /// lifetime: success, or failure under the `Never` policy.
    pub terminal: bool,
}

/// Assess the job from its raw observation.
///
/// An unobservable job maps to `Unknown` and is retried next pass; it is
/// never an error.
pub fn assess_job(spec: &JobSpec, observed: ObservedJob) -> JobAssessment {
    match observed {
        ObservedJob::NotFound => JobAssessment {
            state: JobState::Unknown,
            resubmit: false,
            terminal: false,
        },
        ObservedJob::Running => JobAssessment {
            state: JobState::Running,
            resubmit: false,
            terminal: false,
        },
        ObservedJob::Succeeded => JobAssessment {
            state: JobState::Succeeded,
            resubmit: false,
            terminal: true,
        },
        ObservedJob::Failed => match spec.restart_policy {
            JobRestartPolicy::OnFailure => JobAssessment {
                state: JobState::Failed,
                resubmit: true,
                terminal: false,
            },
            JobRestartPolicy::Never => JobAssessment {
                state: JobState::Failed,
                resubmit: false,
                terminal: true,
            },
        },
    }
}
