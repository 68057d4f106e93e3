use chrono::Utc;
use firecamp_alloc::release_ip;
use firecamp_domain::{ClusterName, ServiceName, ServiceStatus};
use firecamp_driver::DriverRegistry;
use firecamp_store::{list_all, MetadataStore, StoreError};
use tracing::{info, warn};

use crate::error::ControlError;

/// `DeleteService(cluster, serviceName)`. Returns the cloud volume IDs
/// deleted, for external confirmation. Idempotent: safe to call repeatedly,
/// including after a crash mid-deletion.
pub async fn delete_service(
    store: &dyn MetadataStore,
    drivers: &DriverRegistry,
    cluster: &ClusterName,
    service_name: &ServiceName,
) -> Result<Vec<String>, ControlError> {
    // 1. Resolve UUID; absent is success (idempotent).
    let service_uuid = match store.get_service(cluster, service_name).await {
        Ok(svc) => svc.service_uuid,
        Err(StoreError::RecordNotFound(_)) => return Ok(vec![]),
        Err(e) => return Err(e.into()),
    };

    // 2. Conditionally set ServiceAttr.Status = DELETING.
    let attr = match store.get_service_attr(service_uuid).await {
        Ok(attr) if attr.status != ServiceStatus::Deleting && attr.status != ServiceStatus::Deleted => {
            let mut next = attr.clone();
            next.status = ServiceStatus::Deleting;
            next.last_modified = Utc::now();
            match store.update_service_attr(&attr, &next).await {
                Ok(()) => Some(next),
                Err(StoreError::ConditionalCheckFailed(_)) => {
                    store.get_service_attr(service_uuid).await.ok()
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(attr) => Some(attr),
        Err(StoreError::RecordNotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    let mut deleted_volumes = Vec::new();

    // 3. Members: DNS, static IP, volumes, row.
    let members = list_all(|token| store.list_service_members(service_uuid, 0, token)).await?;
    for member in members {
        if let (Some(attr), true) = (&attr, attr.as_ref().map(|a| a.register_dns).unwrap_or(false)) {
            let fqdn = format!("{}.{}", member.member_name, attr.domain_name);
            if let Err(e) = drivers.dns.delete_a(&attr.hosted_zone_id, &fqdn).await {
                warn!(%service_uuid, fqdn, error = %e, "best-effort dns delete failed");
            }
        }

        if let Some(ip) = &member.static_ip {
            match store.get_static_ip(ip).await {
                Ok(ip_row) => release_ip(store, drivers.server.as_ref(), &ip_row).await?,
                Err(StoreError::RecordNotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }

        if let Err(e) = drivers.volume.delete_volume(&member.volumes.primary_volume_id).await {
            warn!(%service_uuid, volume = %member.volumes.primary_volume_id, error = %e, "best-effort volume delete failed");
        } else {
            deleted_volumes.push(member.volumes.primary_volume_id.clone());
        }
        if let Some(journal_id) = &member.volumes.journal_volume_id {
            if let Err(e) = drivers.volume.delete_volume(journal_id).await {
                warn!(%service_uuid, volume = %journal_id, error = %e, "best-effort journal volume delete failed");
            } else {
                deleted_volumes.push(journal_id.clone());
            }
        }

        match store.delete_service_member(service_uuid, member.member_index).await {
            Ok(()) | Err(StoreError::RecordNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    // 4. ConfigFiles.
    let configs = list_all(|token| store.list_config_files(service_uuid, 0, token)).await?;
    for cf in configs {
        match store.delete_config_file(service_uuid, cf.file_id).await {
            Ok(()) | Err(StoreError::RecordNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    // 5. Any straggler static-ip rows.
    let ips = list_all(|token| store.list_static_ips(service_uuid, 0, token)).await?;
    for ip in ips {
        release_ip(store, drivers.server.as_ref(), &ip).await?;
    }

    // 6. ServiceAttr, Service, Devices.
    match store.delete_service_attr(service_uuid).await {
        Ok(()) | Err(StoreError::RecordNotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }
    match store.delete_service(cluster, service_name).await {
        Ok(()) | Err(StoreError::RecordNotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let devices = list_all(|token| store.list_devices(cluster, 0, token)).await?;
    for dev in devices.into_iter().filter(|d| &d.service_name == service_name) {
        match store.delete_device(cluster, &dev.device_name).await {
            Ok(()) | Err(StoreError::RecordNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    info!(%service_uuid, cluster = %cluster, service = %service_name, "service deleted");
    Ok(deleted_volumes)
}
