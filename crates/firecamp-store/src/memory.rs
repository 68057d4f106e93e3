use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use firecamp_domain::{
    ClusterName, ConfigFile, Device, DeviceName, Service, ServiceAttr, ServiceMember, ServiceName,
    ServiceStaticIp, ServiceUuid,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{ContinuationToken, MetadataStore, Page};

#[derive(Debug, Default)]
struct Inner {
    devices: HashMap<(ClusterName, DeviceName), Device>,
    services: HashMap<(ClusterName, ServiceName), Service>,
    service_attrs: HashMap<ServiceUuid, ServiceAttr>,
    members: HashMap<(ServiceUuid, u32), ServiceMember>,
    config_files: HashMap<(ServiceUuid, Uuid), ConfigFile>,
    static_ips: HashMap<String, ServiceStaticIp>,
}

/// In-memory implementation of [`MetadataStore`].
///
/// All data is lost on process exit. Used by every unit/integration test in
/// `firecamp-alloc`/`firecamp-control`, and by `firecamp-cli bootstrap --ephemeral`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Paginate an already-sorted `Vec` using a plain decimal-offset token.
fn paginate<T: Clone>(items: &[T], limit: u32, token: Option<ContinuationToken>) -> Page<T> {
    let start = token
        .as_ref()
        .and_then(|t| t.0.parse::<usize>().ok())
        .unwrap_or(0);
    let limit = if limit == 0 { items.len() } else { limit as usize };
    let end = (start + limit).min(items.len());
    let page_items = items.get(start..end).unwrap_or(&[]).to_vec();
    let next = if end < items.len() {
        Some(ContinuationToken(end.to_string()))
    } else {
        None
    };
    Page { items: page_items, next }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn create_device(&self, dev: &Device) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let key = (dev.cluster_name.clone(), dev.device_name.clone());
        if guard.devices.contains_key(&key) {
            return Err(StoreError::ConditionalCheckFailed(format!(
                "device {} already exists in {}",
                dev.device_name, dev.cluster_name
            )));
        }
        guard.devices.insert(key, dev.clone());
        Ok(())
    }

    async fn get_device(
        &self,
        cluster: &ClusterName,
        device: &DeviceName,
    ) -> Result<Device, StoreError> {
        let guard = self.inner.read().await;
        guard
            .devices
            .get(&(cluster.clone(), device.clone()))
            .cloned()
            .ok_or_else(|| StoreError::RecordNotFound(format!("device {}/{}", cluster, device)))
    }

    async fn delete_device(
        &self,
        cluster: &ClusterName,
        device: &DeviceName,
    ) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard
            .devices
            .remove(&(cluster.clone(), device.clone()))
            .ok_or_else(|| StoreError::RecordNotFound(format!("device {}/{}", cluster, device)))?;
        Ok(())
    }

    async fn list_devices(
        &self,
        cluster: &ClusterName,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<Device>, StoreError> {
        let guard = self.inner.read().await;
        let mut items: Vec<Device> = guard
            .devices
            .values()
            .filter(|d| &d.cluster_name == cluster)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.device_name.as_str().cmp(b.device_name.as_str()));
        Ok(paginate(&items, limit, token))
    }

    async fn create_service(&self, svc: &Service) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let key = (svc.cluster_name.clone(), svc.service_name.clone());
        if guard.services.contains_key(&key) {
            return Err(StoreError::ConditionalCheckFailed(format!(
                "service {} already exists in {}",
                svc.service_name, svc.cluster_name
            )));
        }
        guard.services.insert(key, svc.clone());
        Ok(())
    }

    async fn get_service(
        &self,
        cluster: &ClusterName,
        name: &ServiceName,
    ) -> Result<Service, StoreError> {
        let guard = self.inner.read().await;
        guard
            .services
            .get(&(cluster.clone(), name.clone()))
            .cloned()
            .ok_or_else(|| StoreError::RecordNotFound(format!("service {}/{}", cluster, name)))
    }

    async fn delete_service(
        &self,
        cluster: &ClusterName,
        name: &ServiceName,
    ) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard
            .services
            .remove(&(cluster.clone(), name.clone()))
            .ok_or_else(|| StoreError::RecordNotFound(format!("service {}/{}", cluster, name)))?;
        Ok(())
    }

    async fn list_services(
        &self,
        cluster: &ClusterName,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<Service>, StoreError> {
        let guard = self.inner.read().await;
        let mut items: Vec<Service> = guard
            .services
            .values()
            .filter(|s| &s.cluster_name == cluster)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.service_name.as_str().cmp(b.service_name.as_str()));
        Ok(paginate(&items, limit, token))
    }

    async fn create_service_attr(&self, attr: &ServiceAttr) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        if guard.service_attrs.contains_key(&attr.service_uuid) {
            return Err(StoreError::ConditionalCheckFailed(format!(
                "service attr {} already exists",
                attr.service_uuid
            )));
        }
        guard.service_attrs.insert(attr.service_uuid, attr.clone());
        Ok(())
    }

    async fn get_service_attr(&self, uuid: ServiceUuid) -> Result<ServiceAttr, StoreError> {
        let guard = self.inner.read().await;
        guard
            .service_attrs
            .get(&uuid)
            .cloned()
            .ok_or_else(|| StoreError::RecordNotFound(format!("service attr {}", uuid)))
    }

    async fn update_service_attr(
        &self,
        old: &ServiceAttr,
        new: &ServiceAttr,
    ) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        match guard.service_attrs.get(&old.service_uuid) {
            Some(current) if current == old => {
                guard.service_attrs.insert(new.service_uuid, new.clone());
                Ok(())
            }
            Some(_) => Err(StoreError::ConditionalCheckFailed(format!(
                "service attr {} changed since last read",
                old.service_uuid
            ))),
            None => Err(StoreError::RecordNotFound(format!(
                "service attr {}",
                old.service_uuid
            ))),
        }
    }

    async fn delete_service_attr(&self, uuid: ServiceUuid) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard
            .service_attrs
            .remove(&uuid)
            .ok_or_else(|| StoreError::RecordNotFound(format!("service attr {}", uuid)))?;
        Ok(())
    }

    async fn create_service_member(&self, m: &ServiceMember) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let key = (m.service_uuid, m.member_index);
        if guard.members.contains_key(&key) {
            return Err(StoreError::ConditionalCheckFailed(format!(
                "member {}/{} already exists",
                m.service_uuid, m.member_index
            )));
        }
        guard.members.insert(key, m.clone());
        Ok(())
    }

    async fn get_service_member(
        &self,
        uuid: ServiceUuid,
        index: u32,
    ) -> Result<ServiceMember, StoreError> {
        let guard = self.inner.read().await;
        guard
            .members
            .get(&(uuid, index))
            .cloned()
            .ok_or_else(|| StoreError::RecordNotFound(format!("member {}/{}", uuid, index)))
    }

    async fn update_service_member(
        &self,
        old: &ServiceMember,
        new: &ServiceMember,
    ) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let key = (old.service_uuid, old.member_index);
        match guard.members.get(&key) {
            Some(current) if current == old => {
                guard.members.insert((new.service_uuid, new.member_index), new.clone());
                Ok(())
            }
            Some(_) => Err(StoreError::ConditionalCheckFailed(format!(
                "member {}/{} changed since last read",
                old.service_uuid, old.member_index
            ))),
            None => Err(StoreError::RecordNotFound(format!(
                "member {}/{}",
                old.service_uuid, old.member_index
            ))),
        }
    }

    async fn delete_service_member(&self, uuid: ServiceUuid, index: u32) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard
            .members
            .remove(&(uuid, index))
            .ok_or_else(|| StoreError::RecordNotFound(format!("member {}/{}", uuid, index)))?;
        Ok(())
    }

    async fn list_service_members(
        &self,
        uuid: ServiceUuid,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<ServiceMember>, StoreError> {
        let guard = self.inner.read().await;
        let mut items: Vec<ServiceMember> = guard
            .members
            .values()
            .filter(|m| m.service_uuid == uuid)
            .cloned()
            .collect();
        items.sort_by_key(|m| m.member_index);
        Ok(paginate(&items, limit, token))
    }

    async fn create_config_file(&self, cf: &ConfigFile) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let key = (cf.service_uuid, cf.file_id);
        if guard.config_files.contains_key(&key) {
            return Err(StoreError::ConditionalCheckFailed(format!(
                "config file {}/{} already exists",
                cf.service_uuid, cf.file_id
            )));
        }
        guard.config_files.insert(key, cf.clone());
        Ok(())
    }

    async fn get_config_file(
        &self,
        uuid: ServiceUuid,
        file_id: Uuid,
    ) -> Result<ConfigFile, StoreError> {
        let guard = self.inner.read().await;
        guard
            .config_files
            .get(&(uuid, file_id))
            .cloned()
            .ok_or_else(|| StoreError::RecordNotFound(format!("config file {}/{}", uuid, file_id)))
    }

    async fn delete_config_file(&self, uuid: ServiceUuid, file_id: Uuid) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard
            .config_files
            .remove(&(uuid, file_id))
            .ok_or_else(|| StoreError::RecordNotFound(format!("config file {}/{}", uuid, file_id)))?;
        Ok(())
    }

    async fn list_config_files(
        &self,
        uuid: ServiceUuid,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<ConfigFile>, StoreError> {
        let guard = self.inner.read().await;
        let mut items: Vec<ConfigFile> = guard
            .config_files
            .values()
            .filter(|c| c.service_uuid == uuid)
            .cloned()
            .collect();
        items.sort_by_key(|c| c.file_id);
        Ok(paginate(&items, limit, token))
    }

    async fn create_static_ip(&self, ip: &ServiceStaticIp) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        if guard.static_ips.contains_key(&ip.static_ip) {
            return Err(StoreError::ConditionalCheckFailed(format!(
                "static ip {} already exists",
                ip.static_ip
            )));
        }
        guard.static_ips.insert(ip.static_ip.clone(), ip.clone());
        Ok(())
    }

    async fn get_static_ip(&self, ip: &str) -> Result<ServiceStaticIp, StoreError> {
        let guard = self.inner.read().await;
        guard
            .static_ips
            .get(ip)
            .cloned()
            .ok_or_else(|| StoreError::RecordNotFound(format!("static ip {}", ip)))
    }

    async fn delete_static_ip(&self, ip: &str) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard
            .static_ips
            .remove(ip)
            .ok_or_else(|| StoreError::RecordNotFound(format!("static ip {}", ip)))?;
        Ok(())
    }

    async fn list_static_ips(
        &self,
        uuid: ServiceUuid,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<ServiceStaticIp>, StoreError> {
        let guard = self.inner.read().await;
        let mut items: Vec<ServiceStaticIp> = guard
            .static_ips
            .values()
            .filter(|s| s.service_uuid == uuid)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.static_ip.cmp(&b.static_ip));
        Ok(paginate(&items, limit, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firecamp_domain::ClusterName;

    fn dev(cluster: &str, name: &str, service: &str) -> Device {
        Device {
            cluster_name: ClusterName::new(cluster),
            device_name: DeviceName::new(name),
            service_name: ServiceName::new(service),
        }
    }

    #[tokio::test]
    async fn create_then_get_device() {
        let store = MemoryStore::new();
        store.create_device(&dev("c1", "/dev/xvdf", "svc")).await.unwrap();
        let got = store
            .get_device(&ClusterName::new("c1"), &DeviceName::new("/dev/xvdf"))
            .await
            .unwrap();
        assert_eq!(got.service_name.as_str(), "svc");
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let store = MemoryStore::new();
        store.create_device(&dev("c1", "/dev/xvdf", "a")).await.unwrap();
        let err = store.create_device(&dev("c1", "/dev/xvdf", "b")).await;
        assert!(matches!(err, Err(StoreError::ConditionalCheckFailed(_))));
    }

    #[tokio::test]
    async fn missing_get_not_found() {
        let store = MemoryStore::new();
        let err = store
            .get_device(&ClusterName::new("c1"), &DeviceName::new("/dev/xvdf"))
            .await;
        assert!(matches!(err, Err(StoreError::RecordNotFound(_))));
    }

    #[tokio::test]
    async fn missing_delete_not_found() {
        let store = MemoryStore::new();
        let err = store
            .delete_device(&ClusterName::new("c1"), &DeviceName::new("/dev/xvdf"))
            .await;
        assert!(matches!(err, Err(StoreError::RecordNotFound(_))));
    }

    #[tokio::test]
    async fn list_devices_paginates() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .create_device(&dev("c1", &format!("/dev/xvd{}", i), "svc"))
                .await
                .unwrap();
        }
        let page1 = store
            .list_devices(&ClusterName::new("c1"), 2, None)
            .await
            .unwrap();
        assert_eq!(page1.items.len(), 2);
        assert!(page1.next.is_some());

        let page2 = store
            .list_devices(&ClusterName::new("c1"), 2, page1.next)
            .await
            .unwrap();
        assert_eq!(page2.items.len(), 2);

        let page3 = store
            .list_devices(&ClusterName::new("c1"), 2, page2.next)
            .await
            .unwrap();
        assert_eq!(page3.items.len(), 1);
        assert!(page3.next.is_none());
    }
}
