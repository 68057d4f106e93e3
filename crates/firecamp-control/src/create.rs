use chrono::Utc;
use firecamp_alloc::{assign_device, ensure_ips_for_zone};
use firecamp_domain::{
    member_name, CreateServiceRequest, Service, ServiceAttr, ServiceStatus, ServiceUuid,
    ServiceVolumes,
};
use firecamp_driver::DriverRegistry;
use firecamp_store::{MetadataStore, StoreError};
use tracing::info;

use crate::configfile::ensure_config_file;
use crate::error::ControlError;
use crate::member::build_member;

/// `CreateService(req, domain, vpcID) → ServiceUUID`. Every step is
/// idempotent on resume: re-running this function for a service that
/// already exists picks up wherever the prior attempt left off.
pub async fn create_service(
    store: &dyn MetadataStore,
    drivers: &DriverRegistry,
    req: &CreateServiceRequest,
    domain: &str,
    vpc_id: &str,
    region: &str,
) -> Result<ServiceUuid, ControlError> {
    // 1. Validate.
    req.validate()?;

    // 2. Primary device.
    let primary_dev = assign_device(store, &req.cluster_name, &req.service_name, None).await?;

    // 3. Journal device, if requested.
    let journal_dev = if req.volumes.journal_volume.is_some() {
        Some(assign_device(store, &req.cluster_name, &req.service_name, Some(&primary_dev)).await?)
    } else {
        None
    };

    // 4. Service row.
    let service_uuid = {
        let fresh = Service {
            cluster_name: req.cluster_name.clone(),
            service_name: req.service_name.clone(),
            service_uuid: ServiceUuid::new(),
        };
        match store.create_service(&fresh).await {
            Ok(()) => {
                info!(cluster = %req.cluster_name, service = %req.service_name, uuid = %fresh.service_uuid, "service row created");
                fresh.service_uuid
            }
            Err(StoreError::ConditionalCheckFailed(_)) => {
                store.get_service(&req.cluster_name, &req.service_name).await?.service_uuid
            }
            Err(e) => return Err(e.into()),
        }
    };

    // 5. DNS zone.
    let hosted_zone_id = drivers
        .dns
        .get_or_create_hosted_zone(domain, vpc_id, region, false)
        .await?;

    // 6. ServiceAttr.
    let volumes = ServiceVolumes {
        primary_device_name: primary_dev,
        primary_volume: req.volumes.primary_volume.clone(),
        journal_device_name: journal_dev,
        journal_volume: req.volumes.journal_volume.clone(),
    };
    match store.get_service_attr(service_uuid).await {
        Ok(_) => {}
        Err(StoreError::RecordNotFound(_)) => {
            let attr = ServiceAttr {
                service_uuid,
                status: ServiceStatus::Creating,
                replicas: req.replicas,
                cluster_name: req.cluster_name.clone(),
                service_name: req.service_name.clone(),
                volumes,
                register_dns: req.register_dns,
                domain_name: domain.to_string(),
                hosted_zone_id: hosted_zone_id.clone(),
                require_static_ip: req.require_static_ip,
                resource: req.resource,
                user_attr: req.user_attr.clone(),
                service_type: req.service_type,
                last_modified: Utc::now(),
            };
            match store.create_service_attr(&attr).await {
                Ok(()) => {
                    info!(%service_uuid, "service attr created, status=CREATING");
                }
                Err(StoreError::ConditionalCheckFailed(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Err(e) => return Err(e.into()),
    }
    let attr = store.get_service_attr(service_uuid).await?;

    // 7. Per-member loop.
    let mut ips_used_in_zone: std::collections::HashMap<String, usize> =
        std::collections::HashMap::new();
    for idx in 0..req.replicas {
        let name = member_name(&req.service_name, idx);
        let replica = &req.replica_configs[idx as usize];
        let zone = replica.zone.clone().unwrap_or_default();

        match store.get_service_member(service_uuid, idx).await {
            Ok(existing) => {
                info!(%service_uuid, idx, "member already built, resuming");
                if existing.static_ip.is_some() {
                    *ips_used_in_zone.entry(existing.available_zone.clone()).or_insert(0) += 1;
                }
                continue;
            }
            Err(StoreError::RecordNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let member_config = ensure_config_file(store, service_uuid, replica).await?;

        let static_ip = if req.require_static_ip {
            let slot = *ips_used_in_zone.get(&zone).unwrap_or(&0);
            let mut ips = ensure_ips_for_zone(store, drivers.server.as_ref(), service_uuid, &zone, slot + 1)
                .await?;
            ips.sort_by(|a, b| a.static_ip.cmp(&b.static_ip));
            let chosen = ips[slot].static_ip.clone();
            ips_used_in_zone.insert(zone.clone(), slot + 1);
            Some(chosen)
        } else {
            None
        };

        build_member(
            store,
            drivers,
            service_uuid,
            idx,
            &zone,
            &name,
            static_ip,
            vec![member_config],
            &attr.volumes,
        )
        .await?;
    }

    // 8. DNS publish.
    if req.register_dns {
        let members = firecamp_store::list_all(|token| {
            store.list_service_members(service_uuid, 0, token)
        })
        .await?;
        for m in members {
            if let Some(ip) = &m.static_ip {
                let fqdn = format!("{}.{}", m.member_name, attr.domain_name);
                drivers.dns.upsert_a(&hosted_zone_id, &fqdn, ip).await?;
            }
        }
    }

    // 9. Status remains CREATING until `set_service_initialized` is called.
    Ok(service_uuid)
}
