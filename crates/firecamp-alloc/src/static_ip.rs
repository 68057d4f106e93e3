use std::collections::HashSet;

use firecamp_domain::{ServiceStaticIp, ServiceUuid};
use firecamp_driver::ServerDriver;
use firecamp_store::{list_all, MetadataStore, StoreError};
use tracing::{debug, info, warn};

use crate::error::AllocError;

fn u32_to_ip(n: u32) -> String {
    format!(
        "{}.{}.{}.{}",
        (n >> 24) & 0xff,
        (n >> 16) & 0xff,
        (n >> 8) & 0xff,
        n & 0xff
    )
}

/// Ensures at least `count` static IPs exist for `service_uuid` in `zone`,
/// allocating any shortfall against the zone's CIDR.
///
/// The returned NIC identifiers are placeholders (`eni-<uuid>-<n>`): at this
/// point in the Service Creation Pipeline no member has been scheduled onto a
/// concrete instance yet, so there is no real NIC to attach to. The scheduler
/// is expected to repoint `network_interface_id` once a member lands on an
/// instance; this allocator's job is only to reserve the address itself.
pub async fn ensure_ips_for_zone(
    store: &dyn MetadataStore,
    server: &dyn ServerDriver,
    service_uuid: ServiceUuid,
    zone: &str,
    count: usize,
) -> Result<Vec<ServiceStaticIp>, AllocError> {
    let existing = list_all(|token| store.list_static_ips(service_uuid, 0, token)).await?;
    let mut in_zone: Vec<ServiceStaticIp> =
        existing.into_iter().filter(|ip| ip.available_zone == zone).collect();

    if in_zone.len() >= count {
        debug!(%service_uuid, zone, "sufficient static ips already reserved");
        return Ok(in_zone);
    }

    let need = count - in_zone.len();
    let cidr = server
        .get_cidr_block(zone)
        .await
        .map_err(|e| AllocError::Driver(e.to_string()))?;
    let in_use: HashSet<String> = server
        .list_in_use_ips(zone)
        .await
        .map_err(|e| AllocError::Driver(e.to_string()))?
        .into_iter()
        .collect();
    let already_chosen: HashSet<String> = in_zone.iter().map(|ip| ip.static_ip.clone()).collect();

    let mut allocated = 0usize;
    for addr in cidr.start..=cidr.end {
        if allocated >= need {
            break;
        }
        let candidate = u32_to_ip(addr);
        if in_use.contains(&candidate) || already_chosen.contains(&candidate) {
            continue;
        }

        let nic = format!("eni-{}-{}", service_uuid, in_zone.len() + allocated);
        server
            .assign_static_ip(&nic, &candidate)
            .await
            .map_err(|e| AllocError::Driver(e.to_string()))?;

        let row = ServiceStaticIp {
            static_ip: candidate.clone(),
            service_uuid,
            available_zone: zone.to_string(),
            server_instance_id: String::new(),
            network_interface_id: nic,
        };

        match store.create_static_ip(&row).await {
            Ok(()) => {
                info!(%service_uuid, zone, ip = %candidate, "static ip reserved");
                in_zone.push(row);
                allocated += 1;
            }
            Err(StoreError::ConditionalCheckFailed(_)) => {
                warn!(ip = %candidate, "static ip candidate raced, re-reading");
                match store.get_static_ip(&candidate).await {
                    Ok(owner) if owner.service_uuid == service_uuid => {
                        in_zone.push(owner);
                        allocated += 1;
                    }
                    Ok(_) => {
                        // owned by a different service, try the next address
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    if allocated < need {
        return Err(AllocError::NoFreeIp {
            service: service_uuid.to_string(),
            zone: zone.to_string(),
        });
    }

    Ok(in_zone)
}

/// Releases a static IP: detaches it from its NIC, then deletes the row. A
/// crash between the two leaves an orphan row that the next deletion attempt
/// cleans up (detach before delete).
pub async fn release_ip(
    store: &dyn MetadataStore,
    server: &dyn ServerDriver,
    ip: &ServiceStaticIp,
) -> Result<(), AllocError> {
    server
        .unassign_static_ip(&ip.network_interface_id, &ip.static_ip)
        .await
        .map_err(|e| AllocError::Driver(e.to_string()))?;
    match store.delete_static_ip(&ip.static_ip).await {
        Ok(()) | Err(StoreError::RecordNotFound(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firecamp_driver::LocalServerDriver;
    use firecamp_store::MemoryStore;
    use uuid::Uuid;

    #[tokio::test]
    async fn allocates_requested_count() {
        let store = MemoryStore::new();
        let server = LocalServerDriver::new();
        let uuid = ServiceUuid(Uuid::new_v4());
        let ips = ensure_ips_for_zone(&store, &server, uuid, "us-east-1a", 3).await.unwrap();
        assert_eq!(ips.len(), 3);
        let unique: HashSet<_> = ips.iter().map(|i| i.static_ip.clone()).collect();
        assert_eq!(unique.len(), 3);
    }

    #[tokio::test]
    async fn is_idempotent_on_resume() {
        let store = MemoryStore::new();
        let server = LocalServerDriver::new();
        let uuid = ServiceUuid(Uuid::new_v4());
        let first = ensure_ips_for_zone(&store, &server, uuid, "us-east-1a", 2).await.unwrap();
        let second = ensure_ips_for_zone(&store, &server, uuid, "us-east-1a", 2).await.unwrap();
        let first_set: HashSet<_> = first.iter().map(|i| i.static_ip.clone()).collect();
        let second_set: HashSet<_> = second.iter().map(|i| i.static_ip.clone()).collect();
        assert_eq!(first_set, second_set);
    }

    #[tokio::test]
    async fn release_then_reallocate_reuses_address_space() {
        let store = MemoryStore::new();
        let server = LocalServerDriver::new();
        let uuid = ServiceUuid(Uuid::new_v4());
        let ips = ensure_ips_for_zone(&store, &server, uuid, "us-east-1a", 1).await.unwrap();
        release_ip(&store, &server, &ips[0]).await.unwrap();
        assert!(store.get_static_ip(&ips[0].static_ip).await.is_err());
        let in_use = server.list_in_use_ips("us-east-1a").await.unwrap();
        assert!(!in_use.contains(&ips[0].static_ip));
    }
}
