//! Component status aggregation.
//!
//! Pure mapping from raw component observations to per-component
//! [`ComponentState`] values and the aggregate core-readiness predicate.

use crate::crd::{ComponentState, FlinkClusterSpec};

use super::observed::{ComponentSnapshot, ObservedComponent};

/// Per-component readiness computed for one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentAssessment {
    /// JobManager deployment readiness.
    pub job_manager_deployment: ComponentState,
    /// JobManager service readiness.
    pub job_manager_service: ComponentState,
    /// TaskManager deployment readiness.
    pub task_manager_deployment: ComponentState,
}

impl ComponentAssessment {
    /// True iff all three core components are ready. The job is only
    /// submitted once this holds, since it needs a live JobManager.
    pub fn core_ready(&self) -> bool {
        self.job_manager_deployment == ComponentState::Ready
            && self.job_manager_service == ComponentState::Ready
            && self.task_manager_deployment == ComponentState::Ready
    }
}

/// Readiness of a single component against its replica target. Absence and
/// observer unavailability are never ready.
fn component_state(observed: ObservedComponent, target: i32) -> ComponentState {
    match observed {
        ObservedComponent::Absent | ObservedComponent::Unobservable => ComponentState::NotReady,
        ObservedComponent::Present { ready_replicas } if ready_replicas >= target => {
            ComponentState::Ready
        }
        ObservedComponent::Present { .. } => ComponentState::NotReady,
    }
}

/// Assess all core components against the spec's replica targets.
///
/// The service has no replica notion; existing is ready.
pub fn assess_components(
    spec: &FlinkClusterSpec,
    snapshot: &ComponentSnapshot,
) -> ComponentAssessment {
    ComponentAssessment {
        job_manager_deployment: component_state(
            snapshot.job_manager_deployment,
            spec.job_manager.replicas_or_default(),
        ),
        job_manager_service: component_state(snapshot.job_manager_service, 0),
        task_manager_deployment: component_state(
            snapshot.task_manager_deployment,
            spec.task_manager.replicas,
        ),
    }
}
