use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use firecamp_domain::{
    ClusterName, ConfigFile, Device, DeviceName, Service, ServiceAttr, ServiceMember, ServiceName,
    ServiceStaticIp, ServiceUuid,
};
use redb::{Database, ReadableTable, TableDefinition};
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{ContinuationToken, MetadataStore, Page};

const DEVICES: TableDefinition<&str, &[u8]> = TableDefinition::new("devices");
const SERVICES: TableDefinition<&str, &[u8]> = TableDefinition::new("services");
const SERVICE_ATTRS: TableDefinition<&str, &[u8]> = TableDefinition::new("service_attrs");
const MEMBERS: TableDefinition<&str, &[u8]> = TableDefinition::new("members");
const CONFIG_FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("config_files");
const STATIC_IPS: TableDefinition<&str, &[u8]> = TableDefinition::new("static_ips");

fn device_key(cluster: &ClusterName, device: &DeviceName) -> String {
    format!("{}\u{0}{}", cluster.as_str(), device.as_str())
}

fn service_key(cluster: &ClusterName, name: &ServiceName) -> String {
    format!("{}\u{0}{}", cluster.as_str(), name.as_str())
}

fn member_key(uuid: ServiceUuid, index: u32) -> String {
    format!("{}\u{0}{:010}", uuid, index)
}

fn config_file_key(uuid: ServiceUuid, file_id: Uuid) -> String {
    format!("{}\u{0}{}", uuid, file_id)
}

fn internal<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Internal(e.to_string())
}

/// Persistent state store backed by a `redb` database file.
///
/// All records survive process restarts. Default store for a single-box
/// `firecamp-cli bootstrap` deployment.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open (or create) a redb database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(internal)?;
        }
        let db = Database::create(path).map_err(internal)?;
        {
            let wtxn = db.begin_write().map_err(internal)?;
            wtxn.open_table(DEVICES).map_err(internal)?;
            wtxn.open_table(SERVICES).map_err(internal)?;
            wtxn.open_table(SERVICE_ATTRS).map_err(internal)?;
            wtxn.open_table(MEMBERS).map_err(internal)?;
            wtxn.open_table(CONFIG_FILES).map_err(internal)?;
            wtxn.open_table(STATIC_IPS).map_err(internal)?;
            wtxn.commit().map_err(internal)?;
        }
        Ok(Self { db: Arc::new(db) })
    }

    fn get_raw(&self, table: TableDefinition<&str, &[u8]>, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.db.begin_read().map_err(internal)?;
        let t = rtxn.open_table(table).map_err(internal)?;
        Ok(t.get(key).map_err(internal)?.map(|g| g.value().to_vec()))
    }

    fn create_raw(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
        bytes: &[u8],
        what: &str,
    ) -> Result<(), StoreError> {
        let wtxn = self.db.begin_write().map_err(internal)?;
        {
            let mut t = wtxn.open_table(table).map_err(internal)?;
            if t.get(key).map_err(internal)?.is_some() {
                return Err(StoreError::ConditionalCheckFailed(format!(
                    "{} already exists",
                    what
                )));
            }
            t.insert(key, bytes).map_err(internal)?;
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    fn delete_raw(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
        what: &str,
    ) -> Result<(), StoreError> {
        let wtxn = self.db.begin_write().map_err(internal)?;
        {
            let mut t = wtxn.open_table(table).map_err(internal)?;
            if t.remove(key).map_err(internal)?.is_none() {
                return Err(StoreError::RecordNotFound(what.to_string()));
            }
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    fn list_raw<T: serde::de::DeserializeOwned>(
        &self,
        table: TableDefinition<&str, &[u8]>,
        mut keep: impl FnMut(&T) -> bool,
    ) -> Result<Vec<T>, StoreError> {
        let rtxn = self.db.begin_read().map_err(internal)?;
        let t = rtxn.open_table(table).map_err(internal)?;
        let mut out = Vec::new();
        for entry in t.iter().map_err(internal)? {
            let (_k, v) = entry.map_err(internal)?;
            let item: T = serde_json::from_slice(v.value())?;
            if keep(&item) {
                out.push(item);
            }
        }
        Ok(out)
    }

    /// Conditionally replace `old` with `new` in `table`, keyed by `key`.
    /// `old` must `==` the stored record for the write to succeed.
    fn update_raw<T: serde::Serialize + serde::de::DeserializeOwned + PartialEq>(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
        old: &T,
        new: &T,
        what: &str,
    ) -> Result<(), StoreError> {
        let wtxn = self.db.begin_write().map_err(internal)?;
        {
            let mut t = wtxn.open_table(table).map_err(internal)?;
            match t.get(key).map_err(internal)? {
                None => return Err(StoreError::RecordNotFound(what.to_string())),
                Some(guard) => {
                    let current: T = serde_json::from_slice(guard.value())?;
                    if &current != old {
                        return Err(StoreError::ConditionalCheckFailed(format!(
                            "{} changed since last read",
                            what
                        )));
                    }
                }
            }
            let bytes = serde_json::to_vec(new)?;
            t.insert(key, bytes.as_slice()).map_err(internal)?;
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }
}

fn paginate<T: Clone>(items: &[T], limit: u32, token: Option<ContinuationToken>) -> Page<T> {
    let start = token.as_ref().and_then(|t| t.0.parse::<usize>().ok()).unwrap_or(0);
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
impl MetadataStore for RedbStore {
    async fn create_device(&self, dev: &Device) -> Result<(), StoreError> {
        let key = device_key(&dev.cluster_name, &dev.device_name);
        let bytes = serde_json::to_vec(dev)?;
        self.create_raw(DEVICES, &key, &bytes, &format!("device {}", key))
    }

    async fn get_device(&self, cluster: &ClusterName, device: &DeviceName) -> Result<Device, StoreError> {
        let key = device_key(cluster, device);
        self.get_raw(DEVICES, &key)?
            .ok_or_else(|| StoreError::RecordNotFound(format!("device {}", key)))
            .and_then(|b| Ok(serde_json::from_slice(&b)?))
    }

    async fn delete_device(&self, cluster: &ClusterName, device: &DeviceName) -> Result<(), StoreError> {
        let key = device_key(cluster, device);
        self.delete_raw(DEVICES, &key, &format!("device {}", key))
    }

    async fn list_devices(
        &self,
        cluster: &ClusterName,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<Device>, StoreError> {
        let mut items: Vec<Device> = self.list_raw(DEVICES, |d: &Device| &d.cluster_name == cluster)?;
        items.sort_by(|a, b| a.device_name.as_str().cmp(b.device_name.as_str()));
        Ok(paginate(&items, limit, token))
    }

    async fn create_service(&self, svc: &Service) -> Result<(), StoreError> {
        let key = service_key(&svc.cluster_name, &svc.service_name);
        let bytes = serde_json::to_vec(svc)?;
        self.create_raw(SERVICES, &key, &bytes, &format!("service {}", key))
    }

    async fn get_service(&self, cluster: &ClusterName, name: &ServiceName) -> Result<Service, StoreError> {
        let key = service_key(cluster, name);
        self.get_raw(SERVICES, &key)?
            .ok_or_else(|| StoreError::RecordNotFound(format!("service {}", key)))
            .and_then(|b| Ok(serde_json::from_slice(&b)?))
    }

    async fn delete_service(&self, cluster: &ClusterName, name: &ServiceName) -> Result<(), StoreError> {
        let key = service_key(cluster, name);
        self.delete_raw(SERVICES, &key, &format!("service {}", key))
    }

    async fn list_services(
        &self,
        cluster: &ClusterName,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<Service>, StoreError> {
        let mut items: Vec<Service> = self.list_raw(SERVICES, |s: &Service| &s.cluster_name == cluster)?;
        items.sort_by(|a, b| a.service_name.as_str().cmp(b.service_name.as_str()));
        Ok(paginate(&items, limit, token))
    }

    async fn create_service_attr(&self, attr: &ServiceAttr) -> Result<(), StoreError> {
        let key = attr.service_uuid.to_string();
        let bytes = serde_json::to_vec(attr)?;
        self.create_raw(SERVICE_ATTRS, &key, &bytes, &format!("service attr {}", key))
    }

    async fn get_service_attr(&self, uuid: ServiceUuid) -> Result<ServiceAttr, StoreError> {
        let key = uuid.to_string();
        self.get_raw(SERVICE_ATTRS, &key)?
            .ok_or_else(|| StoreError::RecordNotFound(format!("service attr {}", key)))
            .and_then(|b| Ok(serde_json::from_slice(&b)?))
    }

    async fn update_service_attr(&self, old: &ServiceAttr, new: &ServiceAttr) -> Result<(), StoreError> {
        let key = old.service_uuid.to_string();
        self.update_raw(SERVICE_ATTRS, &key, old, new, &format!("service attr {}", key))
    }

    async fn delete_service_attr(&self, uuid: ServiceUuid) -> Result<(), StoreError> {
        let key = uuid.to_string();
        self.delete_raw(SERVICE_ATTRS, &key, &format!("service attr {}", key))
    }

    async fn create_service_member(&self, m: &ServiceMember) -> Result<(), StoreError> {
        let key = member_key(m.service_uuid, m.member_index);
        let bytes = serde_json::to_vec(m)?;
        self.create_raw(MEMBERS, &key, &bytes, &format!("member {}", key))
    }

    async fn get_service_member(&self, uuid: ServiceUuid, index: u32) -> Result<ServiceMember, StoreError> {
        let key = member_key(uuid, index);
        self.get_raw(MEMBERS, &key)?
            .ok_or_else(|| StoreError::RecordNotFound(format!("member {}", key)))
            .and_then(|b| Ok(serde_json::from_slice(&b)?))
    }

    async fn update_service_member(&self, old: &ServiceMember, new: &ServiceMember) -> Result<(), StoreError> {
        let key = member_key(old.service_uuid, old.member_index);
        self.update_raw(MEMBERS, &key, old, new, &format!("member {}", key))
    }

    async fn delete_service_member(&self, uuid: ServiceUuid, index: u32) -> Result<(), StoreError> {
        let key = member_key(uuid, index);
        self.delete_raw(MEMBERS, &key, &format!("member {}", key))
    }

    async fn list_service_members(
        &self,
        uuid: ServiceUuid,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<ServiceMember>, StoreError> {
        let mut items: Vec<ServiceMember> =
            self.list_raw(MEMBERS, |m: &ServiceMember| m.service_uuid == uuid)?;
        items.sort_by_key(|m| m.member_index);
        Ok(paginate(&items, limit, token))
    }

    async fn create_config_file(&self, cf: &ConfigFile) -> Result<(), StoreError> {
        let key = config_file_key(cf.service_uuid, cf.file_id);
        let bytes = serde_json::to_vec(cf)?;
        self.create_raw(CONFIG_FILES, &key, &bytes, &format!("config file {}", key))
    }

    async fn get_config_file(&self, uuid: ServiceUuid, file_id: Uuid) -> Result<ConfigFile, StoreError> {
        let key = config_file_key(uuid, file_id);
        self.get_raw(CONFIG_FILES, &key)?
            .ok_or_else(|| StoreError::RecordNotFound(format!("config file {}", key)))
            .and_then(|b| Ok(serde_json::from_slice(&b)?))
    }

    async fn delete_config_file(&self, uuid: ServiceUuid, file_id: Uuid) -> Result<(), StoreError> {
        let key = config_file_key(uuid, file_id);
        self.delete_raw(CONFIG_FILES, &key, &format!("config file {}", key))
    }

    async fn list_config_files(
        &self,
        uuid: ServiceUuid,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<ConfigFile>, StoreError> {
        let mut items: Vec<ConfigFile> =
            self.list_raw(CONFIG_FILES, |c: &ConfigFile| c.service_uuid == uuid)?;
        items.sort_by_key(|c| c.file_id);
        Ok(paginate(&items, limit, token))
    }

    async fn create_static_ip(&self, ip: &ServiceStaticIp) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(ip)?;
        self.create_raw(STATIC_IPS, &ip.static_ip, &bytes, &format!("static ip {}", ip.static_ip))
    }

    async fn get_static_ip(&self, ip: &str) -> Result<ServiceStaticIp, StoreError> {
        self.get_raw(STATIC_IPS, ip)?
            .ok_or_else(|| StoreError::RecordNotFound(format!("static ip {}", ip)))
            .and_then(|b| Ok(serde_json::from_slice(&b)?))
    }

    async fn delete_static_ip(&self, ip: &str) -> Result<(), StoreError> {
        self.delete_raw(STATIC_IPS, ip, &format!("static ip {}", ip))
    }

    async fn list_static_ips(
        &self,
        uuid: ServiceUuid,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<ServiceStaticIp>, StoreError> {
        let mut items: Vec<ServiceStaticIp> =
            self.list_raw(STATIC_IPS, |s: &ServiceStaticIp| s.service_uuid == uuid)?;
        items.sort_by(|a, b| a.static_ip.cmp(&b.static_ip));
        Ok(paginate(&items, limit, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (RedbStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.redb");
        (RedbStore::open(&path).unwrap(), dir)
    }

    #[tokio::test]
    async fn create_get_delete_device_roundtrip() {
        let (store, _dir) = temp_store();
        let dev = Device {
            cluster_name: ClusterName::new("c1"),
            device_name: DeviceName::new("/dev/xvdf"),
            service_name: ServiceName::new("svc"),
        };
        store.create_device(&dev).await.unwrap();
        let got = store.get_device(&dev.cluster_name, &dev.device_name).await.unwrap();
        assert_eq!(got, dev);
        store.delete_device(&dev.cluster_name, &dev.device_name).await.unwrap();
        assert!(store.get_device(&dev.cluster_name, &dev.device_name).await.is_err());
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.redb");
        let dev = Device {
            cluster_name: ClusterName::new("c1"),
            device_name: DeviceName::new("/dev/xvdf"),
            service_name: ServiceName::new("svc"),
        };
        {
            let store = RedbStore::open(&path).unwrap();
            store.create_device(&dev).await.unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        let got = store.get_device(&dev.cluster_name, &dev.device_name).await.unwrap();
        assert_eq!(got, dev);
    }
}
