use chrono::Utc;
use firecamp_domain::{
    MemberConfig, MemberStatus, MemberVolumes, ServiceMember, ServiceUuid, ServiceVolumes,
};
use firecamp_driver::DriverRegistry;
use firecamp_store::{MetadataStore, StoreError};
use tracing::info;

use crate::error::ControlError;

/// Builds (or resumes) one `ServiceMember`: creates its volumes, assembles
/// the record, and writes it.
#[allow(clippy::too_many_arguments)]
pub async fn build_member(
    store: &dyn MetadataStore,
    drivers: &DriverRegistry,
    service_uuid: ServiceUuid,
    member_index: u32,
    zone: &str,
    member_name: &str,
    static_ip: Option<String>,
    configs: Vec<MemberConfig>,
    volumes_req: &ServiceVolumes,
) -> Result<ServiceMember, ControlError> {
    let requires_journal = volumes_req.has_journal();

    match store.get_service_member(service_uuid, member_index).await {
        Ok(existing) if existing.volumes.is_complete(requires_journal) => {
            return Ok(existing);
        }
        Ok(_) | Err(StoreError::RecordNotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let primary = &volumes_req.primary_volume;
    let primary_volume_id = drivers
        .volume
        .create_volume(
            zone,
            primary.volume_type,
            primary.volume_size_gb,
            Some(primary.iops).filter(|_| primary.iops > 0),
            primary.encrypted,
        )
        .await?;

    let journal_volume_id = if let Some(journal) = &volumes_req.journal_volume {
        Some(
            drivers
                .volume
                .create_volume(
                    zone,
                    journal.volume_type,
                    journal.volume_size_gb,
                    Some(journal.iops).filter(|_| journal.iops > 0),
                    journal.encrypted,
                )
                .await?,
        )
    } else {
        None
    };

    let member = ServiceMember {
        service_uuid,
        member_index,
        status: MemberStatus::Active,
        member_name: member_name.to_string(),
        available_zone: zone.to_string(),
        task_id: String::new(),
        container_instance_id: String::new(),
        server_instance_id: String::new(),
        volumes: MemberVolumes {
            primary_volume_id,
            primary_device_name: volumes_req.primary_device_name.clone(),
            journal_volume_id,
            journal_device_name: volumes_req.journal_device_name.clone(),
        },
        static_ip,
        configs,
        last_modified: Utc::now(),
    };

    match store.create_service_member(&member).await {
        Ok(()) => {
            info!(%service_uuid, member_index, member_name, "member created");
            Ok(member)
        }
        Err(StoreError::ConditionalCheckFailed(_)) => {
            // Another coordinator finished building this member first; the
            // volumes this call just created are an accepted orphan.
            Ok(store.get_service_member(service_uuid, member_index).await?)
        }
        Err(e) => Err(e.into()),
    }
}
