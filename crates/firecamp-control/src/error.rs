use thiserror::Error;

use firecamp_alloc::AllocError;
use firecamp_domain::DomainError;
use firecamp_driver::DriverError;
use firecamp_store::StoreError;

/// Error taxonomy surfaced by the core pipelines.
///
/// `ConditionalCheckFailed` never appears here — every layer below treats it
/// as a benign race signal and re-reads before this error type is reached.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] DomainError),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("external collaborator unavailable: {0}")]
    ExternalUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ControlError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::RecordNotFound(msg) => ControlError::RecordNotFound(msg),
            // A ConditionalCheckFailed reaching this far means the caller
            // didn't re-read as required; surface it as an internal bug
            // rather than silently retrying indefinitely.
            StoreError::ConditionalCheckFailed(msg) => ControlError::Internal(msg),
            StoreError::Internal(msg) => ControlError::Internal(msg),
        }
    }
}

impl From<AllocError> for ControlError {
    fn from(e: AllocError) -> Self {
        match e {
            AllocError::NoDevice(_) | AllocError::NoFreeIp { .. } => {
                ControlError::ResourceExhausted(e.to_string())
            }
            AllocError::IpOwnedByOther(msg) => ControlError::Internal(msg),
            AllocError::Store(store_err) => store_err.into(),
            AllocError::Driver(msg) => ControlError::ExternalUnavailable(msg),
        }
    }
}

impl From<DriverError> for ControlError {
    fn from(e: DriverError) -> Self {
        ControlError::ExternalUnavailable(e.to_string())
    }
}
