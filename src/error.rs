//! Error taxonomy of the reconciliation engine.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// A route or address string failed to parse.
    #[error("malformed CIDR: {0}")]
    MalformedCidr(String),

    /// No tunnel address could be resolved from facts or options.
    #[error("no tunnel address available yet")]
    NotReady,

    #[error("applying network settings failed: {0}")]
    ApplyFailed(String),

    /// Settings were applied but the packet handle could not be re-bound.
    #[error("rebinding tunnel file descriptor failed: {0}")]
    RebindFailed(String),

    #[error("a settings update is still in progress")]
    StillInProgress,

    #[error("reconciler has stopped")]
    Stopped,

    #[error("host command failed: {0}")]
    Command(String),
}

impl ReconcileError {
    /// Failures the host process must be told about.
    pub fn is_reportable(&self) -> bool {
        matches!(
            self,
            ReconcileError::ApplyFailed(_) | ReconcileError::RebindFailed(_)
        )
    }
}
