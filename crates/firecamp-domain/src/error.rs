use thiserror::Error;

/// Request-validation failures. Always non-retryable — surfaced to the caller
/// as-is, never triggers a resume or retry.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("service name '{0}' must match [A-Za-z][A-Za-z0-9-]*")]
    InvalidServiceName(String),

    #[error("replicas must be >= 1, got {0}")]
    InvalidReplicas(i64),

    #[error("expected {expected} replica configs, got {got}")]
    ReplicaConfigCountMismatch { expected: usize, got: usize },

    #[error("replica {0} requires a zone because the service requires a static IP")]
    MissingZone(u32),

    #[error("stateless services must not request a journal device")]
    StatelessJournalNotAllowed,
}
