use firecamp_domain::{ClusterName, Device, DeviceName, ServiceName};
use firecamp_store::{list_all, MetadataStore, StoreError};
use tracing::{debug, info, warn};

use crate::error::AllocError;

/// Enumerates the platform's candidate device names in a fixed, deterministic
/// order; the candidate sequence is fixed, not configurable.
fn candidates() -> impl Iterator<Item = String> {
    let single = (b'f'..=b'z').map(|c| format!("/dev/xvd{}", c as char));
    let double = (b'a'..=b'z').flat_map(|first| {
        (b'a'..=b'z').map(move |second| format!("/dev/xvdb{}{}", first as char, second as char))
    });
    single.chain(double)
}

/// Assigns a device name unique within `cluster`, resuming an in-progress
/// allocation for `service` if one already exists.
pub async fn assign_device(
    store: &dyn MetadataStore,
    cluster: &ClusterName,
    service: &ServiceName,
    exclude_device: Option<&DeviceName>,
) -> Result<DeviceName, AllocError> {
    let existing = list_all(|token| store.list_devices(cluster, 0, token)).await?;

    if let Some(dev) = existing.iter().find(|d| {
        &d.service_name == service && exclude_device.is_none_or(|ex| &d.device_name != ex)
    }) {
        debug!(cluster = %cluster, service = %service, device = %dev.device_name, "resuming prior device allocation");
        return Ok(dev.device_name.clone());
    }

    let taken: std::collections::HashSet<&str> =
        existing.iter().map(|d| d.device_name.as_str()).collect();

    for candidate in candidates() {
        if taken.contains(candidate.as_str()) {
            continue;
        }
        if let Some(ex) = exclude_device {
            if ex.as_str() == candidate {
                continue;
            }
        }
        let device_name = DeviceName::new(candidate.clone());
        let dev = Device {
            cluster_name: cluster.clone(),
            device_name: device_name.clone(),
            service_name: service.clone(),
        };
        match store.create_device(&dev).await {
            Ok(()) => {
                info!(cluster = %cluster, service = %service, device = %device_name, "device allocated");
                return Ok(device_name);
            }
            Err(StoreError::ConditionalCheckFailed(_)) => {
                warn!(device = %device_name, "device candidate raced, advancing");
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AllocError::NoDevice(cluster.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use firecamp_store::MemoryStore;

    #[tokio::test]
    async fn assigns_first_candidate() {
        let store = MemoryStore::new();
        let cluster = ClusterName::new("c1");
        let service = ServiceName::new("mydb");
        let dev = assign_device(&store, &cluster, &service, None).await.unwrap();
        assert_eq!(dev.as_str(), "/dev/xvdf");
    }

    #[tokio::test]
    async fn second_service_gets_next_candidate() {
        let store = MemoryStore::new();
        let cluster = ClusterName::new("c1");
        assign_device(&store, &cluster, &ServiceName::new("svc-a"), None).await.unwrap();
        let dev = assign_device(&store, &cluster, &ServiceName::new("svc-b"), None).await.unwrap();
        assert_eq!(dev.as_str(), "/dev/xvdg");
    }

    #[tokio::test]
    async fn resumes_existing_allocation_for_same_service() {
        let store = MemoryStore::new();
        let cluster = ClusterName::new("c1");
        let service = ServiceName::new("mydb");
        let first = assign_device(&store, &cluster, &service, None).await.unwrap();
        let second = assign_device(&store, &cluster, &service, None).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn journal_device_excludes_primary() {
        let store = MemoryStore::new();
        let cluster = ClusterName::new("c1");
        let service = ServiceName::new("mydb");
        let primary = assign_device(&store, &cluster, &service, None).await.unwrap();
        let journal = assign_device(&store, &cluster, &service, Some(&primary)).await.unwrap();
        assert_ne!(primary, journal);
        assert_eq!(journal.as_str(), "/dev/xvdg");
    }
}
