use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use firecamp_domain::VolumeType;
use tracing::debug;
use uuid::Uuid;

use crate::error::DriverError;
use crate::traits::{CidrBlock, DnsDriver, ServerDriver, VolumeDriver};

/// Stub volume driver that simulates cloud block storage locally.
///
/// Produces synthetic volume IDs and performs no actual I/O, matching the
/// `LocalDriver` convention: deterministic fake behavior usable in tests and
/// the CLI's `bootstrap` one-box demo.
#[derive(Debug, Default, Clone)]
pub struct LocalVolumeDriver;

impl LocalVolumeDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VolumeDriver for LocalVolumeDriver {
    async fn create_volume(
        &self,
        zone: &str,
        volume_type: VolumeType,
        size_gb: i64,
        iops: Option<i64>,
        encrypted: bool,
    ) -> Result<String, DriverError> {
        let id = format!("vol-{}", Uuid::new_v4());
        debug!(%id, zone, ?volume_type, size_gb, ?iops, encrypted, "LocalVolumeDriver: create_volume");
        Ok(id)
    }

    async fn delete_volume(&self, volume_id: &str) -> Result<(), DriverError> {
        debug!(volume_id, "LocalVolumeDriver: delete_volume");
        Ok(())
    }
}

/// Stub DNS driver. Tracks created zones in memory so `get_or_create_hosted_zone`
/// is idempotent per domain within a process; `upsert_a`/`delete_a` are no-ops
/// beyond logging, since nothing downstream reads DNS record state back.
#[derive(Debug, Default)]
pub struct LocalDnsDriver {
    zones: Mutex<HashMap<String, String>>,
}

impl LocalDnsDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DnsDriver for LocalDnsDriver {
    async fn get_or_create_hosted_zone(
        &self,
        domain: &str,
        vpc_id: &str,
        region: &str,
        private: bool,
    ) -> Result<String, DriverError> {
        let mut zones = self.zones.lock().unwrap();
        if let Some(id) = zones.get(domain) {
            return Ok(id.clone());
        }
        let id = format!("zone-{}", Uuid::new_v4());
        debug!(domain, vpc_id, region, private, %id, "LocalDnsDriver: created hosted zone");
        zones.insert(domain.to_string(), id.clone());
        Ok(id)
    }

    async fn upsert_a(&self, zone_id: &str, fqdn: &str, ip: &str) -> Result<(), DriverError> {
        debug!(zone_id, fqdn, ip, "LocalDnsDriver: upsert_a");
        Ok(())
    }

    async fn delete_a(&self, zone_id: &str, fqdn: &str) -> Result<(), DriverError> {
        debug!(zone_id, fqdn, "LocalDnsDriver: delete_a");
        Ok(())
    }
}

/// Stub server driver. Assigns each zone a deterministic `/24` and tracks
/// which addresses within it are currently "attached" to a NIC, so
/// `list_in_use_ips` reflects `assign_static_ip`/`unassign_static_ip` calls
/// made through this same instance.
#[derive(Debug, Default)]
pub struct LocalServerDriver {
    assigned: Mutex<HashSet<String>>,
}

impl LocalServerDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn zone_octet(zone: &str) -> u8 {
        let sum: u32 = zone.bytes().map(|b| b as u32).sum();
        (sum % 254) as u8 + 1
    }

    fn zone_of_ip(ip: &str) -> Option<u8> {
        let mut parts = ip.split('.');
        let first = parts.next()?;
        let second = parts.next()?;
        if first != "10" {
            return None;
        }
        second.parse::<u8>().ok()
    }
}

#[async_trait]
impl ServerDriver for LocalServerDriver {
    async fn get_cidr_block(&self, zone: &str) -> Result<CidrBlock, DriverError> {
        let octet = Self::zone_octet(zone);
        let base = (10u32 << 24) | ((octet as u32) << 16);
        Ok(CidrBlock {
            prefix: format!("10.{}.0.0/24", octet),
            start: base + 1,
            end: base + 254,
            netmask: "255.255.255.0".to_string(),
        })
    }

    async fn assign_static_ip(&self, nic: &str, ip: &str) -> Result<(), DriverError> {
        debug!(nic, ip, "LocalServerDriver: assign_static_ip");
        self.assigned.lock().unwrap().insert(ip.to_string());
        Ok(())
    }

    async fn unassign_static_ip(&self, nic: &str, ip: &str) -> Result<(), DriverError> {
        debug!(nic, ip, "LocalServerDriver: unassign_static_ip");
        self.assigned.lock().unwrap().remove(ip);
        Ok(())
    }

    async fn list_in_use_ips(&self, zone: &str) -> Result<Vec<String>, DriverError> {
        let octet = Self::zone_octet(zone);
        let assigned = self.assigned.lock().unwrap();
        Ok(assigned
            .iter()
            .filter(|ip| Self::zone_of_ip(ip) == Some(octet))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn volume_driver_generates_unique_ids() {
        let d = LocalVolumeDriver::new();
        let a = d.create_volume("us-east-1a", VolumeType::Gp2, 10, None, false).await.unwrap();
        let b = d.create_volume("us-east-1a", VolumeType::Gp2, 10, None, false).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn dns_driver_hosted_zone_is_idempotent_per_domain() {
        let d = LocalDnsDriver::new();
        let a = d.get_or_create_hosted_zone("example.com", "vpc-1", "us-east-1", false).await.unwrap();
        let b = d.get_or_create_hosted_zone("example.com", "vpc-1", "us-east-1", false).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn server_driver_tracks_assigned_ips_per_zone() {
        let d = LocalServerDriver::new();
        let cidr = d.get_cidr_block("us-east-1a").await.unwrap();
        assert!(cidr.start < cidr.end);
        d.assign_static_ip("eni-1", "10.5.0.2").await.ok();
        // fabricate an ip actually within this zone's block for a real check
        let octet = LocalServerDriver::zone_octet("us-east-1a");
        let ip = format!("10.{}.0.5", octet);
        d.assign_static_ip("eni-2", &ip).await.unwrap();
        let in_use = d.list_in_use_ips("us-east-1a").await.unwrap();
        assert!(in_use.contains(&ip));
        d.unassign_static_ip("eni-2", &ip).await.unwrap();
        let in_use = d.list_in_use_ips("us-east-1a").await.unwrap();
        assert!(!in_use.contains(&ip));
    }
}
