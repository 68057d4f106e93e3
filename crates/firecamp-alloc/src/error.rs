use thiserror::Error;

#[derive(Debug, Error)]
pub enum AllocError {
    #[error("no free device name for cluster {0}")]
    NoDevice(String),

    #[error("no free static ip in zone {zone} for service {service}")]
    NoFreeIp { service: String, zone: String },

    #[error("static ip {0} is owned by a different service")]
    IpOwnedByOther(String),

    #[error("store error: {0}")]
    Store(#[from] firecamp_store::StoreError),

    #[error("driver error: {0}")]
    Driver(String),
}
