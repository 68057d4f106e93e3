use async_trait::async_trait;
use firecamp_domain::VolumeType;

use crate::error::DriverError;

/// Creates and destroys cloud block volumes.
#[async_trait]
pub trait VolumeDriver: Send + Sync + 'static {
    async fn create_volume(
        &self,
        zone: &str,
        volume_type: VolumeType,
        size_gb: i64,
        iops: Option<i64>,
        encrypted: bool,
    ) -> Result<String, DriverError>;

    async fn delete_volume(&self, volume_id: &str) -> Result<(), DriverError>;
}

/// Manages DNS zones and `A` records for service members.
#[async_trait]
pub trait DnsDriver: Send + Sync + 'static {
    async fn get_or_create_hosted_zone(
        &self,
        domain: &str,
        vpc_id: &str,
        region: &str,
        private: bool,
    ) -> Result<String, DriverError>;

    async fn upsert_a(&self, zone_id: &str, fqdn: &str, ip: &str) -> Result<(), DriverError>;

    async fn delete_a(&self, zone_id: &str, fqdn: &str) -> Result<(), DriverError>;
}

/// Describes a zone's address space and its in-use addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidrBlock {
    pub prefix: String,
    pub start: u32,
    pub end: u32,
    pub netmask: String,
}

/// Assigns and releases static IPs on network interfaces, and reports the
/// free address space of a zone.
#[async_trait]
pub trait ServerDriver: Send + Sync + 'static {
    async fn get_cidr_block(&self, zone: &str) -> Result<CidrBlock, DriverError>;

    async fn assign_static_ip(&self, nic: &str, ip: &str) -> Result<(), DriverError>;

    async fn unassign_static_ip(&self, nic: &str, ip: &str) -> Result<(), DriverError>;

    async fn list_in_use_ips(&self, zone: &str) -> Result<Vec<String>, DriverError>;
}
