use std::sync::Arc;

use crate::traits::{DnsDriver, ServerDriver, VolumeDriver};

/// Holds the single active set of external collaborators for this process.
///
/// Not keyed by cloud or region: this control plane coordinates a single
/// cluster, so one volume/DNS/server driver triple serves every service.
#[derive(Clone)]
pub struct DriverRegistry {
    pub volume: Arc<dyn VolumeDriver>,
    pub dns: Arc<dyn DnsDriver>,
    pub server: Arc<dyn ServerDriver>,
}

impl DriverRegistry {
    pub fn new(volume: Arc<dyn VolumeDriver>, dns: Arc<dyn DnsDriver>, server: Arc<dyn ServerDriver>) -> Self {
        Self { volume, dns, server }
    }

    /// Registry wired to the local in-memory stub drivers, for tests and
    /// `firecamp-cli bootstrap`.
    pub fn local() -> Self {
        use crate::local::{LocalDnsDriver, LocalServerDriver, LocalVolumeDriver};
        Self::new(
            Arc::new(LocalVolumeDriver::new()),
            Arc::new(LocalDnsDriver::new()),
            Arc::new(LocalServerDriver::new()),
        )
    }
}
