use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("volume operation failed: {0}")]
    VolumeFailed(String),

    #[error("dns operation failed: {0}")]
    DnsFailed(String),

    #[error("server operation failed: {0}")]
    ServerFailed(String),

    #[error("internal driver error: {0}")]
    Internal(String),
}
