use thiserror::Error;

/// Error kinds surfaced by the metadata store.
///
/// Callers must treat `ConditionalCheckFailed` as a benign race signal and
/// re-read rather than propagate it as a hard failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("conditional check failed: {0}")]
    ConditionalCheckFailed(String),

    #[error("internal store error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Internal(e.to_string())
    }
}
