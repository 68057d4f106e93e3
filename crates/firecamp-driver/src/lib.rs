mod error;
mod local;
mod registry;
mod traits;

pub use error::DriverError;
pub use local::{LocalDnsDriver, LocalServerDriver, LocalVolumeDriver};
pub use registry::DriverRegistry;
pub use traits::{CidrBlock, DnsDriver, ServerDriver, VolumeDriver};
