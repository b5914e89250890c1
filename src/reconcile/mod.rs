//! The reconciliation core.
//!
//! One call to [`reconcile_pass`] turns a snapshot of observations into the
//! next [`FlinkClusterStatus`] and the directives for the orchestration
//! layer. The core is pure: no I/O, no clocks (the pass timestamp is an
//! input), and idempotent for identical inputs, so the controller can simply
//! invoke it again on its next tick.

mod components;
mod job;
mod observed;
mod state_machine;

pub use components::{assess_components, ComponentAssessment};
pub use job::{assess_job, JobAssessment};
pub use observed::{ComponentSnapshot, Observations, ObservedComponent, ObservedJob};
pub use state_machine::{directives, next_state, Directive, StateInput};

use chrono::{DateTime, Utc};

use crate::crd::{
    ComponentStatus, ComponentsStatus, FlinkClusterSpec, FlinkClusterStatus, JobStatus,
};
use crate::error::{OperatorError, OperatorResult};
use crate::naming;

/// Everything a pass produces: the replacement status and the commands for
/// the orchestration layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Complete replacement status for the resource.
    pub status: FlinkClusterStatus,
    /// Commands for the external orchestration layer, in no particular
    /// order of urgency.
    pub directives: Vec<Directive>,
}

/// Run one reconciliation pass.
///
/// Fails only on an invalid spec, an illegal spec mutation, or observations
/// that contradict the cluster's classification; in those cases no status is
/// produced and the caller keeps the previous one. Observation gaps are not
/// failures; they fold into `NotReady`/`Unknown`.
pub fn reconcile_pass(
    spec: &FlinkClusterSpec,
    previous: Option<&FlinkClusterStatus>,
    observations: &Observations,
    now: DateTime<Utc>,
) -> OperatorResult<ReconcileOutcome> {
    spec.validate()?;

    // A cluster's classification is fixed at creation. The previous status
    // carries a job entry iff the spec did, so a flip is visible here.
    if let Some(previous) = previous {
        if previous.job.is_some() != spec.job.is_some() {
            return Err(OperatorError::SpecMutation(
                "spec.job cannot be added or removed after creation".into(),
            ));
        }
    }

    let job_assessment = match (&spec.job, observations.job) {
        (Some(job_spec), Some(observed)) => Some(assess_job(job_spec, observed)),
        (None, None) => None,
        (None, Some(_)) => {
            return Err(OperatorError::Precondition(
                "job observed for a session cluster".into(),
            ));
        }
        (Some(_), None) => {
            return Err(OperatorError::Precondition(
                "job cluster pass ran without a job observation".into(),
            ));
        }
    };

    let assessment = assess_components(spec, &observations.components);
    let input = StateInput {
        previous: previous.map(|status| status.state),
        core_ready: assessment.core_ready(),
        all_components_absent: observations.components.all_absent_now(),
        job: job_assessment,
    };
    let next = next_state(&input);
    let directives = directives(&input, next);

    let mut status = FlinkClusterStatus {
        state: next,
        components: ComponentsStatus {
            job_manager_deployment: ComponentStatus {
                name: naming::job_manager_deployment_name(&spec.name),
                state: assessment.job_manager_deployment,
            },
            job_manager_service: ComponentStatus {
                name: naming::job_manager_service_name(&spec.name),
                state: assessment.job_manager_service,
            },
            task_manager_deployment: ComponentStatus {
                name: naming::task_manager_deployment_name(&spec.name),
                state: assessment.task_manager_deployment,
            },
        },
        job: job_assessment.map(|job| JobStatus {
            name: naming::job_name(&spec.name),
            state: job.state,
        }),
        last_update_time: None,
    };

    // Touch the timestamp only when something actually changed, so repeated
    // identical passes do not churn writes.
    status.last_update_time = match previous {
        Some(previous) if !status.differs_from(previous) => previous.last_update_time.clone(),
        _ => Some(now.to_rfc3339()),
    };

    Ok(ReconcileOutcome { status, directives })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{
        ClusterState, ComponentState, ImageSpec, JobManagerPorts, JobManagerSpec,
        JobRestartPolicy, JobSpec, JobState, TaskManagerPorts, TaskManagerSpec,
    };
    use chrono::TimeZone;

    fn session_spec() -> FlinkClusterSpec {
        FlinkClusterSpec {
            name: "wordcount".into(),
            image: ImageSpec {
                name: "flink:1.8.1".into(),
                pull_policy: None,
            },
            job_manager: JobManagerSpec {
                replicas: None,
                ports: JobManagerPorts::default(),
            },
            task_manager: TaskManagerSpec {
                replicas: 2,
                ports: TaskManagerPorts::default(),
            },
            job: None,
        }
    }

    fn job_cluster_spec(policy: JobRestartPolicy) -> FlinkClusterSpec {
        let mut spec = session_spec();
        spec.job = Some(JobSpec {
            jar_file: "/opt/flink/examples/WordCount.jar".into(),
            class_name: None,
            args: vec![],
            savepoint: None,
            allow_non_restored_state: None,
            parallelism: None,
            no_logging_to_stdout: None,
            restart_policy: policy,
        });
        spec
    }

    fn all_ready() -> ComponentSnapshot {
        ComponentSnapshot {
            job_manager_deployment: ObservedComponent::Present { ready_replicas: 1 },
            job_manager_service: ObservedComponent::Present { ready_replicas: 0 },
            task_manager_deployment: ObservedComponent::Present { ready_replicas: 2 },
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_564_617_600 + secs, 0).unwrap()
    }

    #[test]
    fn fresh_job_cluster_reconciling_with_unknown_job() {
        let spec = job_cluster_spec(JobRestartPolicy::OnFailure);
        let observations = Observations {
            components: ComponentSnapshot::all_absent(),
            job: Some(ObservedJob::NotFound),
        };
        let outcome = reconcile_pass(&spec, None, &observations, at(0)).unwrap();

        assert_eq!(outcome.status.state, ClusterState::Reconciling);
        let job = outcome.status.job.as_ref().unwrap();
        assert_eq!(job.state, JobState::Unknown);
        assert_eq!(job.name, "wordcount-job");
        assert!(outcome.directives.is_empty());
        assert!(outcome.status.last_update_time.is_some());
    }

    #[test]
    fn ready_job_cluster_requests_submission() {
        let spec = job_cluster_spec(JobRestartPolicy::OnFailure);
        let previous = reconcile_pass(
            &spec,
            None,
            &Observations {
                components: ComponentSnapshot::all_absent(),
                job: Some(ObservedJob::NotFound),
            },
            at(0),
        )
        .unwrap()
        .status;

        let observations = Observations {
            components: all_ready(),
            job: Some(ObservedJob::NotFound),
        };
        let outcome = reconcile_pass(&spec, Some(&previous), &observations, at(10)).unwrap();

        assert_eq!(outcome.status.state, ClusterState::Running);
        assert_eq!(outcome.status.job.as_ref().unwrap().state, JobState::Unknown);
        assert_eq!(outcome.directives, vec![Directive::SubmitJob]);
    }

    #[test]
    fn succeeded_job_moves_cluster_to_stopping() {
        let spec = job_cluster_spec(JobRestartPolicy::OnFailure);
        let previous = FlinkClusterStatus {
            state: ClusterState::Running,
            job: Some(crate::crd::JobStatus {
                name: "wordcount-job".into(),
                state: JobState::Running,
            }),
            ..Default::default()
        };
        let observations = Observations {
            components: all_ready(),
            job: Some(ObservedJob::Succeeded),
        };
        let outcome = reconcile_pass(&spec, Some(&previous), &observations, at(20)).unwrap();

        assert_eq!(outcome.status.state, ClusterState::Stopping);
        assert_eq!(
            outcome.status.job.as_ref().unwrap().state,
            JobState::Succeeded
        );
        assert_eq!(outcome.directives, vec![Directive::TearDown]);
    }

    #[test]
    fn session_cluster_regresses_when_task_managers_drop() {
        let spec = session_spec();
        let previous = reconcile_pass(
            &spec,
            None,
            &Observations {
                components: all_ready(),
                job: None,
            },
            at(0),
        )
        .unwrap()
        .status;
        assert_eq!(previous.state, ClusterState::Running);

        let mut degraded = all_ready();
        degraded.task_manager_deployment = ObservedComponent::Present { ready_replicas: 1 };
        let outcome = reconcile_pass(
            &spec,
            Some(&previous),
            &Observations {
                components: degraded,
                job: None,
            },
            at(30),
        )
        .unwrap();

        assert_eq!(outcome.status.state, ClusterState::Reconciling);
        assert_eq!(
            outcome.status.components.task_manager_deployment.state,
            ComponentState::NotReady
        );
    }

    #[test]
    fn failed_never_job_never_resubmits_across_passes() {
        let spec = job_cluster_spec(JobRestartPolicy::Never);
        let mut previous = FlinkClusterStatus {
            state: ClusterState::Running,
            job: Some(crate::crd::JobStatus {
                name: "wordcount-job".into(),
                state: JobState::Running,
            }),
            ..Default::default()
        };

        for pass in 0..3 {
            let outcome = reconcile_pass(
                &spec,
                Some(&previous),
                &Observations {
                    components: all_ready(),
                    job: Some(ObservedJob::Failed),
                },
                at(40 + pass),
            )
            .unwrap();
            assert!(!outcome.directives.contains(&Directive::ResubmitJob));
            previous = outcome.status;
        }
        // Policy-terminal failure tears the job cluster down.
        assert_eq!(previous.state, ClusterState::Stopping);
    }

    #[test]
    fn identical_passes_do_not_touch_the_timestamp() {
        let spec = session_spec();
        let observations = Observations {
            components: all_ready(),
            job: None,
        };
        let first = reconcile_pass(&spec, None, &observations, at(0)).unwrap();
        let second =
            reconcile_pass(&spec, Some(&first.status), &observations, at(60)).unwrap();
        let third =
            reconcile_pass(&spec, Some(&second.status), &observations, at(120)).unwrap();

        // The Reconciling->Running edge updates once; after that the status
        // is stable and the timestamp is carried over untouched.
        assert_eq!(second.status, third.status);
        assert_eq!(
            second.status.last_update_time,
            third.status.last_update_time
        );
    }

    #[test]
    fn status_job_present_iff_spec_job_present() {
        let session = reconcile_pass(
            &session_spec(),
            None,
            &Observations {
                components: all_ready(),
                job: None,
            },
            at(0),
        )
        .unwrap();
        assert!(session.status.job.is_none());

        let job = reconcile_pass(
            &job_cluster_spec(JobRestartPolicy::Never),
            None,
            &Observations {
                components: all_ready(),
                job: Some(ObservedJob::NotFound),
            },
            at(0),
        )
        .unwrap();
        assert!(job.status.job.is_some());
    }

    #[test]
    fn toggling_job_presence_is_rejected() {
        let session = session_spec();
        let previous_with_job = FlinkClusterStatus {
            job: Some(crate::crd::JobStatus::default()),
            ..Default::default()
        };
        let err = reconcile_pass(
            &session,
            Some(&previous_with_job),
            &Observations {
                components: ComponentSnapshot::all_absent(),
                job: None,
            },
            at(0),
        )
        .unwrap_err();
        assert!(matches!(err, OperatorError::SpecMutation(_)));

        let job_cluster = job_cluster_spec(JobRestartPolicy::Never);
        let previous_without_job = FlinkClusterStatus::default();
        let err = reconcile_pass(
            &job_cluster,
            Some(&previous_without_job),
            &Observations {
                components: ComponentSnapshot::all_absent(),
                job: Some(ObservedJob::NotFound),
            },
            at(0),
        )
        .unwrap_err();
        assert!(matches!(err, OperatorError::SpecMutation(_)));
    }

    #[test]
    fn job_observation_on_session_cluster_aborts_the_pass() {
        let err = reconcile_pass(
            &session_spec(),
            None,
            &Observations {
                components: all_ready(),
                job: Some(ObservedJob::Succeeded),
            },
            at(0),
        )
        .unwrap_err();
        assert!(matches!(err, OperatorError::Precondition(_)));
    }

    #[test]
    fn invalid_spec_refuses_to_compute_a_status() {
        let mut spec = session_spec();
        spec.image.name = String::new();
        let err = reconcile_pass(
            &spec,
            None,
            &Observations {
                components: all_ready(),
                job: None,
            },
            at(0),
        )
        .unwrap_err();
        assert!(matches!(err, OperatorError::ValidationError(_)));
    }

    #[test]
    fn stopping_cluster_stops_once_components_are_gone() {
        let spec = job_cluster_spec(JobRestartPolicy::OnFailure);
        let previous = FlinkClusterStatus {
            state: ClusterState::Stopping,
            job: Some(crate::crd::JobStatus {
                name: "wordcount-job".into(),
                state: JobState::Succeeded,
            }),
            ..Default::default()
        };

        // Components still observed: stay Stopping, keep demanding teardown.
        let lingering = reconcile_pass(
            &spec,
            Some(&previous),
            &Observations {
                components: all_ready(),
                job: Some(ObservedJob::Succeeded),
            },
            at(0),
        )
        .unwrap();
        assert_eq!(lingering.status.state, ClusterState::Stopping);
        assert_eq!(lingering.directives, vec![Directive::TearDown]);

        // Everything gone: Stopped, nothing left to command.
        let stopped = reconcile_pass(
            &spec,
            Some(&lingering.status),
            &Observations {
                components: ComponentSnapshot::all_absent(),
                job: Some(ObservedJob::NotFound),
            },
            at(10),
        )
        .unwrap();
        assert_eq!(stopped.status.state, ClusterState::Stopped);
        assert!(stopped.directives.is_empty());
    }

    #[test]
    fn unobservable_components_never_confirm_teardown() {
        // An API outage while stopping makes every component unobservable.
        // That is not evidence the resources are gone: the cluster must hold
        // in Stopping (and keep demanding teardown) instead of terminally
        // declaring Stopped with resources possibly still live.
        let spec = job_cluster_spec(JobRestartPolicy::OnFailure);
        let mut previous = FlinkClusterStatus {
            state: ClusterState::Stopping,
            job: Some(crate::crd::JobStatus {
                name: "wordcount-job".into(),
                state: JobState::Succeeded,
            }),
            ..Default::default()
        };

        let blind = ComponentSnapshot {
            job_manager_deployment: ObservedComponent::Unobservable,
            job_manager_service: ObservedComponent::Unobservable,
            task_manager_deployment: ObservedComponent::Unobservable,
        };
        for pass in 0..3 {
            let outcome = reconcile_pass(
                &spec,
                Some(&previous),
                &Observations {
                    components: blind,
                    job: Some(ObservedJob::NotFound),
                },
                at(pass),
            )
            .unwrap();
            assert_eq!(outcome.status.state, ClusterState::Stopping);
            assert_eq!(outcome.directives, vec![Directive::TearDown]);
            previous = outcome.status;
        }

        // Even one component still only unobservable blocks the transition.
        let mut partial = ComponentSnapshot::all_absent();
        partial.job_manager_service = ObservedComponent::Unobservable;
        let outcome = reconcile_pass(
            &spec,
            Some(&previous),
            &Observations {
                components: partial,
                job: Some(ObservedJob::NotFound),
            },
            at(10),
        )
        .unwrap();
        assert_eq!(outcome.status.state, ClusterState::Stopping);
    }
}
