use async_trait::async_trait;
use firecamp_domain::{
    ClusterName, ConfigFile, Device, DeviceName, Service, ServiceAttr, ServiceMember, ServiceName,
    ServiceStaticIp, ServiceUuid,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// Opaque pagination cursor returned by `list_*` calls. Callers pass it back
/// unmodified to resume a listing; its internal shape is store-specific.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationToken(pub String);

/// One page of a `list_*` call. `next` is `None` once the listing is exhausted.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<ContinuationToken>,
}

impl<T> Page<T> {
    pub fn single(items: Vec<T>) -> Self {
        Page { items, next: None }
    }
}

/// The metadata-store contract: per-entity conditional create/get/update/
/// delete, plus paginated listing.
///
/// `create_*` fails with `ConditionalCheckFailed` if the primary key already
/// exists. `update_*` takes the prior full record and fails with
/// `ConditionalCheckFailed` if the stored record no longer matches it.
/// `get_*`/`delete_*` fail with `RecordNotFound` if the key is absent.
#[async_trait]
pub trait MetadataStore: Send + Sync + 'static {
    // ── Device ────────────────────────────────────────────────────────────
    async fn create_device(&self, dev: &Device) -> Result<(), StoreError>;
    async fn get_device(
        &self,
        cluster: &ClusterName,
        device: &DeviceName,
    ) -> Result<Device, StoreError>;
    async fn delete_device(
        &self,
        cluster: &ClusterName,
        device: &DeviceName,
    ) -> Result<(), StoreError>;
    async fn list_devices(
        &self,
        cluster: &ClusterName,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<Device>, StoreError>;

    // ── Service ───────────────────────────────────────────────────────────
    async fn create_service(&self, svc: &Service) -> Result<(), StoreError>;
    async fn get_service(
        &self,
        cluster: &ClusterName,
        name: &ServiceName,
    ) -> Result<Service, StoreError>;
    async fn delete_service(
        &self,
        cluster: &ClusterName,
        name: &ServiceName,
    ) -> Result<(), StoreError>;
    async fn list_services(
        &self,
        cluster: &ClusterName,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<Service>, StoreError>;

    // ── ServiceAttr ───────────────────────────────────────────────────────
    async fn create_service_attr(&self, attr: &ServiceAttr) -> Result<(), StoreError>;
    async fn get_service_attr(&self, uuid: ServiceUuid) -> Result<ServiceAttr, StoreError>;
    async fn update_service_attr(
        &self,
        old: &ServiceAttr,
        new: &ServiceAttr,
    ) -> Result<(), StoreError>;
    async fn delete_service_attr(&self, uuid: ServiceUuid) -> Result<(), StoreError>;

    // ── ServiceMember ─────────────────────────────────────────────────────
    async fn create_service_member(&self, m: &ServiceMember) -> Result<(), StoreError>;
    async fn get_service_member(
        &self,
        uuid: ServiceUuid,
        index: u32,
    ) -> Result<ServiceMember, StoreError>;
    async fn update_service_member(
        &self,
        old: &ServiceMember,
        new: &ServiceMember,
    ) -> Result<(), StoreError>;
    async fn delete_service_member(&self, uuid: ServiceUuid, index: u32) -> Result<(), StoreError>;
    async fn list_service_members(
        &self,
        uuid: ServiceUuid,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<ServiceMember>, StoreError>;

    // ── ConfigFile ────────────────────────────────────────────────────────
    async fn create_config_file(&self, cf: &ConfigFile) -> Result<(), StoreError>;
    async fn get_config_file(
        &self,
        uuid: ServiceUuid,
        file_id: Uuid,
    ) -> Result<ConfigFile, StoreError>;
    async fn delete_config_file(&self, uuid: ServiceUuid, file_id: Uuid) -> Result<(), StoreError>;
    async fn list_config_files(
        &self,
        uuid: ServiceUuid,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<ConfigFile>, StoreError>;

    // ── ServiceStaticIp ───────────────────────────────────────────────────
    async fn create_static_ip(&self, ip: &ServiceStaticIp) -> Result<(), StoreError>;
    async fn get_static_ip(&self, ip: &str) -> Result<ServiceStaticIp, StoreError>;
    async fn delete_static_ip(&self, ip: &str) -> Result<(), StoreError>;
    async fn list_static_ips(
        &self,
        uuid: ServiceUuid,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<ServiceStaticIp>, StoreError>;
}

/// Drain every page of a `list_*` call into a single `Vec`. Most callers in
/// `firecamp-control`/`firecamp-alloc` want the full set, not a single page.
pub async fn list_all<T, F, Fut>(mut call: F) -> Result<Vec<T>, StoreError>
where
    F: FnMut(Option<ContinuationToken>) -> Fut,
    Fut: std::future::Future<Output = Result<Page<T>, StoreError>>,
{
    let mut out = Vec::new();
    let mut token = None;
    loop {
        let page = call(token).await?;
        out.extend(page.items);
        match page.next {
            Some(next) => token = Some(next),
            None => break,
        }
    }
    Ok(out)
}
