mod device;
mod error;
mod static_ip;

pub use device::assign_device;
pub use error::AllocError;
pub use static_ip::{ensure_ips_for_zone, release_ip};
