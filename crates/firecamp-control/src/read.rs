use firecamp_domain::{ClusterName, ServiceAttr, ServiceMember, ServiceName, ServiceUuid};
use firecamp_store::{list_all, MetadataStore};

use crate::error::ControlError;

/// Direct `MS.Get` with no side effects (SPEC_FULL.md §4.9).
pub async fn get_service_attr(
    store: &dyn MetadataStore,
    uuid: ServiceUuid,
) -> Result<ServiceAttr, ControlError> {
    Ok(store.get_service_attr(uuid).await?)
}

/// Resolves `(cluster, name) → UUID` then fetches the attr.
pub async fn get_service_by_name(
    store: &dyn MetadataStore,
    cluster: &ClusterName,
    name: &ServiceName,
) -> Result<ServiceAttr, ControlError> {
    let svc = store.get_service(cluster, name).await?;
    get_service_attr(store, svc.service_uuid).await
}

/// All members of a service, fully paginated.
pub async fn list_service_members(
    store: &dyn MetadataStore,
    uuid: ServiceUuid,
) -> Result<Vec<ServiceMember>, ControlError> {
    Ok(list_all(|token| store.list_service_members(uuid, 0, token)).await?)
}
