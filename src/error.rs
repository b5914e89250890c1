//! Error types for the Flink operator.

use thiserror::Error;

/// Errors that can occur during operator operations.
///
/// Observation failures (a subordinate resource that cannot currently be
/// seen) are never errors; they fold into `NotReady`/`Unknown` states and
/// are retried on the next pass. Only validation and precondition failures
/// surface here.
#[derive(Debug, Error)]
pub enum OperatorError {
    /// Kubernetes API error.
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// The spec is malformed; no status is computed for it.
    #[error("Invalid spec: {0}")]
    ValidationError(String),

    /// The spec changed in a way that is forbidden after creation.
    #[error("Illegal spec mutation: {0}")]
    SpecMutation(String),

    /// Observations contradict the resource's classification; the pass is
    /// aborted and the previous status retained.
    #[error("Precondition violated: {0}")]
    Precondition(String),
}

/// Result type for operator operations.
pub type OperatorResult<T> = Result<T, OperatorError>;
