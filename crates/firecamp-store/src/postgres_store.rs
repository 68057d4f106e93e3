use async_trait::async_trait;
use firecamp_domain::{
    ClusterName, ConfigFile, Device, DeviceName, Service, ServiceAttr, ServiceMember, ServiceName,
    ServiceStaticIp, ServiceUuid,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{ContinuationToken, MetadataStore, Page};

// DDL — idempotent; run at every startup via migrate(). Every entity is kept
// as a JSONB blob plus whatever columns the access pattern needs an index on,
// following the same shape as a coordinator-agnostic conditional-write KV.
const MIGRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS devices (
    cluster_name TEXT NOT NULL,
    device_name  TEXT NOT NULL,
    data         JSONB NOT NULL,
    PRIMARY KEY (cluster_name, device_name)
);

CREATE TABLE IF NOT EXISTS services (
    cluster_name TEXT NOT NULL,
    service_name TEXT NOT NULL,
    data         JSONB NOT NULL,
    PRIMARY KEY (cluster_name, service_name)
);

CREATE TABLE IF NOT EXISTS service_attrs (
    service_uuid UUID PRIMARY KEY,
    data         JSONB NOT NULL
);

CREATE TABLE IF NOT EXISTS service_members (
    service_uuid UUID NOT NULL,
    member_index INTEGER NOT NULL,
    data         JSONB NOT NULL,
    PRIMARY KEY (service_uuid, member_index)
);

CREATE TABLE IF NOT EXISTS config_files (
    service_uuid UUID NOT NULL,
    file_id      UUID NOT NULL,
    data         JSONB NOT NULL,
    PRIMARY KEY (service_uuid, file_id)
);

CREATE TABLE IF NOT EXISTS service_static_ips (
    static_ip    TEXT PRIMARY KEY,
    service_uuid UUID NOT NULL,
    data         JSONB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_static_ips_service
    ON service_static_ips (service_uuid);
"#;

/// Persistent state store backed by PostgreSQL. Intended for multi-coordinator
/// clusters where several `firecamp-api`/`firecamp-cli` processes race to
/// allocate devices/IPs for the same cluster — `Create` uses `ON CONFLICT DO
/// NOTHING` and `Update` compares the stored JSONB against the caller's prior
/// image, giving the same conditional-write semantics as `MemoryStore`/`RedbStore`.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(url)
            .await
            .map_err(|e| StoreError::Internal(format!("postgres connect: {e}")))?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(MIGRATIONS)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Internal(format!("migration: {e}")))?;
        Ok(())
    }
}

fn to_json<T: serde::Serialize>(v: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(v).map_err(StoreError::from)
}

fn from_json<T: serde::de::DeserializeOwned>(v: serde_json::Value) -> Result<T, StoreError> {
    serde_json::from_value(v).map_err(StoreError::from)
}

fn paginate<T>(mut items: Vec<T>, limit: u32, token: Option<ContinuationToken>) -> Page<T> {
    let start = token.as_ref().and_then(|t| t.0.parse::<usize>().ok()).unwrap_or(0);
    if start >= items.len() {
        return Page { items: Vec::new(), next: None };
    }
    let limit = if limit == 0 { items.len() } else { limit as usize };
    let end = (start + limit).min(items.len());
    let next = if end < items.len() {
        Some(ContinuationToken(end.to_string()))
    } else {
        None
    };
    let page_items = items.drain(start..end).collect();
    Page { items: page_items, next }
}

#[async_trait]
impl MetadataStore for PostgresStore {
    async fn create_device(&self, dev: &Device) -> Result<(), StoreError> {
        let data = to_json(dev)?;
        let result = sqlx::query(
            "INSERT INTO devices (cluster_name, device_name, data) VALUES ($1, $2, $3)
             ON CONFLICT (cluster_name, device_name) DO NOTHING",
        )
        .bind(dev.cluster_name.as_str())
        .bind(dev.device_name.as_str())
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ConditionalCheckFailed(format!(
                "device {}/{} already exists",
                dev.cluster_name, dev.device_name
            )));
        }
        Ok(())
    }

    async fn get_device(&self, cluster: &ClusterName, device: &DeviceName) -> Result<Device, StoreError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT data FROM devices WHERE cluster_name = $1 AND device_name = $2")
                .bind(cluster.as_str())
                .bind(device.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Internal(e.to_string()))?;
        match row {
            Some((data,)) => from_json(data),
            None => Err(StoreError::RecordNotFound(format!("device {}/{}", cluster, device))),
        }
    }

    async fn delete_device(&self, cluster: &ClusterName, device: &DeviceName) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM devices WHERE cluster_name = $1 AND device_name = $2")
            .bind(cluster.as_str())
            .bind(device.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::RecordNotFound(format!("device {}/{}", cluster, device)));
        }
        Ok(())
    }

    async fn list_devices(
        &self,
        cluster: &ClusterName,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<Device>, StoreError> {
        let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
            "SELECT data FROM devices WHERE cluster_name = $1 ORDER BY device_name",
        )
        .bind(cluster.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?;
        let items = rows.into_iter().map(|(d,)| from_json(d)).collect::<Result<Vec<_>, _>>()?;
        Ok(paginate(items, limit, token))
    }

    async fn create_service(&self, svc: &Service) -> Result<(), StoreError> {
        let data = to_json(svc)?;
        let result = sqlx::query(
            "INSERT INTO services (cluster_name, service_name, data) VALUES ($1, $2, $3)
             ON CONFLICT (cluster_name, service_name) DO NOTHING",
        )
        .bind(svc.cluster_name.as_str())
        .bind(svc.service_name.as_str())
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ConditionalCheckFailed(format!(
                "service {}/{} already exists",
                svc.cluster_name, svc.service_name
            )));
        }
        Ok(())
    }

    async fn get_service(&self, cluster: &ClusterName, name: &ServiceName) -> Result<Service, StoreError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT data FROM services WHERE cluster_name = $1 AND service_name = $2")
                .bind(cluster.as_str())
                .bind(name.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Internal(e.to_string()))?;
        match row {
            Some((data,)) => from_json(data),
            None => Err(StoreError::RecordNotFound(format!("service {}/{}", cluster, name))),
        }
    }

    async fn delete_service(&self, cluster: &ClusterName, name: &ServiceName) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM services WHERE cluster_name = $1 AND service_name = $2")
            .bind(cluster.as_str())
            .bind(name.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::RecordNotFound(format!("service {}/{}", cluster, name)));
        }
        Ok(())
    }

    async fn list_services(
        &self,
        cluster: &ClusterName,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<Service>, StoreError> {
        let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
            "SELECT data FROM services WHERE cluster_name = $1 ORDER BY service_name",
        )
        .bind(cluster.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?;
        let items = rows.into_iter().map(|(d,)| from_json(d)).collect::<Result<Vec<_>, _>>()?;
        Ok(paginate(items, limit, token))
    }

    async fn create_service_attr(&self, attr: &ServiceAttr) -> Result<(), StoreError> {
        let data = to_json(attr)?;
        let result = sqlx::query(
            "INSERT INTO service_attrs (service_uuid, data) VALUES ($1, $2)
             ON CONFLICT (service_uuid) DO NOTHING",
        )
        .bind(attr.service_uuid.0)
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ConditionalCheckFailed(format!(
                "service attr {} already exists",
                attr.service_uuid
            )));
        }
        Ok(())
    }

    async fn get_service_attr(&self, uuid: ServiceUuid) -> Result<ServiceAttr, StoreError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT data FROM service_attrs WHERE service_uuid = $1")
                .bind(uuid.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Internal(e.to_string()))?;
        match row {
            Some((data,)) => from_json(data),
            None => Err(StoreError::RecordNotFound(format!("service attr {}", uuid))),
        }
    }

    async fn update_service_attr(&self, old: &ServiceAttr, new: &ServiceAttr) -> Result<(), StoreError> {
        let old_data = to_json(old)?;
        let new_data = to_json(new)?;
        let result = sqlx::query(
            "UPDATE service_attrs SET data = $1 WHERE service_uuid = $2 AND data = $3",
        )
        .bind(&new_data)
        .bind(old.service_uuid.0)
        .bind(&old_data)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?;
        if result.rows_affected() == 0 {
            if self.get_service_attr(old.service_uuid).await.is_err() {
                return Err(StoreError::RecordNotFound(format!("service attr {}", old.service_uuid)));
            }
            return Err(StoreError::ConditionalCheckFailed(format!(
                "service attr {} changed since last read",
                old.service_uuid
            )));
        }
        Ok(())
    }

    async fn delete_service_attr(&self, uuid: ServiceUuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM service_attrs WHERE service_uuid = $1")
            .bind(uuid.0)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::RecordNotFound(format!("service attr {}", uuid)));
        }
        Ok(())
    }

    async fn create_service_member(&self, m: &ServiceMember) -> Result<(), StoreError> {
        let data = to_json(m)?;
        let result = sqlx::query(
            "INSERT INTO service_members (service_uuid, member_index, data) VALUES ($1, $2, $3)
             ON CONFLICT (service_uuid, member_index) DO NOTHING",
        )
        .bind(m.service_uuid.0)
        .bind(m.member_index as i32)
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ConditionalCheckFailed(format!(
                "member {}/{} already exists",
                m.service_uuid, m.member_index
            )));
        }
        Ok(())
    }

    async fn get_service_member(&self, uuid: ServiceUuid, index: u32) -> Result<ServiceMember, StoreError> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            "SELECT data FROM service_members WHERE service_uuid = $1 AND member_index = $2",
        )
        .bind(uuid.0)
        .bind(index as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?;
        match row {
            Some((data,)) => from_json(data),
            None => Err(StoreError::RecordNotFound(format!("member {}/{}", uuid, index))),
        }
    }

    async fn update_service_member(&self, old: &ServiceMember, new: &ServiceMember) -> Result<(), StoreError> {
        let old_data = to_json(old)?;
        let new_data = to_json(new)?;
        let result = sqlx::query(
            "UPDATE service_members SET data = $1 WHERE service_uuid = $2 AND member_index = $3 AND data = $4",
        )
        .bind(&new_data)
        .bind(old.service_uuid.0)
        .bind(old.member_index as i32)
        .bind(&old_data)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?;
        if result.rows_affected() == 0 {
            if self.get_service_member(old.service_uuid, old.member_index).await.is_err() {
                return Err(StoreError::RecordNotFound(format!(
                    "member {}/{}",
                    old.service_uuid, old.member_index
                )));
            }
            return Err(StoreError::ConditionalCheckFailed(format!(
                "member {}/{} changed since last read",
                old.service_uuid, old.member_index
            )));
        }
        Ok(())
    }

    async fn delete_service_member(&self, uuid: ServiceUuid, index: u32) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM service_members WHERE service_uuid = $1 AND member_index = $2")
            .bind(uuid.0)
            .bind(index as i32)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::RecordNotFound(format!("member {}/{}", uuid, index)));
        }
        Ok(())
    }

    async fn list_service_members(
        &self,
        uuid: ServiceUuid,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<ServiceMember>, StoreError> {
        let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
            "SELECT data FROM service_members WHERE service_uuid = $1 ORDER BY member_index",
        )
        .bind(uuid.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?;
        let items = rows.into_iter().map(|(d,)| from_json(d)).collect::<Result<Vec<_>, _>>()?;
        Ok(paginate(items, limit, token))
    }

    async fn create_config_file(&self, cf: &ConfigFile) -> Result<(), StoreError> {
        let data = to_json(cf)?;
        let result = sqlx::query(
            "INSERT INTO config_files (service_uuid, file_id, data) VALUES ($1, $2, $3)
             ON CONFLICT (service_uuid, file_id) DO NOTHING",
        )
        .bind(cf.service_uuid.0)
        .bind(cf.file_id)
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ConditionalCheckFailed(format!(
                "config file {}/{} already exists",
                cf.service_uuid, cf.file_id
            )));
        }
        Ok(())
    }

    async fn get_config_file(&self, uuid: ServiceUuid, file_id: Uuid) -> Result<ConfigFile, StoreError> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            "SELECT data FROM config_files WHERE service_uuid = $1 AND file_id = $2",
        )
        .bind(uuid.0)
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?;
        match row {
            Some((data,)) => from_json(data),
            None => Err(StoreError::RecordNotFound(format!("config file {}/{}", uuid, file_id))),
        }
    }

    async fn delete_config_file(&self, uuid: ServiceUuid, file_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM config_files WHERE service_uuid = $1 AND file_id = $2")
            .bind(uuid.0)
            .bind(file_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::RecordNotFound(format!("config file {}/{}", uuid, file_id)));
        }
        Ok(())
    }

    async fn list_config_files(
        &self,
        uuid: ServiceUuid,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<ConfigFile>, StoreError> {
        let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
            "SELECT data FROM config_files WHERE service_uuid = $1 ORDER BY file_id",
        )
        .bind(uuid.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?;
        let items = rows.into_iter().map(|(d,)| from_json(d)).collect::<Result<Vec<_>, _>>()?;
        Ok(paginate(items, limit, token))
    }

    async fn create_static_ip(&self, ip: &ServiceStaticIp) -> Result<(), StoreError> {
        let data = to_json(ip)?;
        let result = sqlx::query(
            "INSERT INTO service_static_ips (static_ip, service_uuid, data) VALUES ($1, $2, $3)
             ON CONFLICT (static_ip) DO NOTHING",
        )
        .bind(&ip.static_ip)
        .bind(ip.service_uuid.0)
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ConditionalCheckFailed(format!(
                "static ip {} already exists",
                ip.static_ip
            )));
        }
        Ok(())
    }

    async fn get_static_ip(&self, ip: &str) -> Result<ServiceStaticIp, StoreError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT data FROM service_static_ips WHERE static_ip = $1")
                .bind(ip)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Internal(e.to_string()))?;
        match row {
            Some((data,)) => from_json(data),
            None => Err(StoreError::RecordNotFound(format!("static ip {}", ip))),
        }
    }

    async fn delete_static_ip(&self, ip: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM service_static_ips WHERE static_ip = $1")
            .bind(ip)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::RecordNotFound(format!("static ip {}", ip)));
        }
        Ok(())
    }

    async fn list_static_ips(
        &self,
        uuid: ServiceUuid,
        limit: u32,
        token: Option<ContinuationToken>,
    ) -> Result<Page<ServiceStaticIp>, StoreError> {
        let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
            "SELECT data FROM service_static_ips WHERE service_uuid = $1 ORDER BY static_ip",
        )
        .bind(uuid.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?;
        let items = rows.into_iter().map(|(d,)| from_json(d)).collect::<Result<Vec<_>, _>>()?;
        Ok(paginate(items, limit, token))
    }
}
