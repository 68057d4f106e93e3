use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

// ── Identifiers ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterName(pub String);

impl ClusterName {
    pub fn new(s: impl Into<String>) -> Self {
        ClusterName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClusterName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceName(pub String);

impl ServiceName {
    pub fn new(s: impl Into<String>) -> Self {
        ServiceName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `[A-Za-z][A-Za-z0-9-]*` per the naming convention.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut chars = self.0.chars();
        let ok = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
            }
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(DomainError::InvalidServiceName(self.0.clone()))
        }
    }
}

impl std::fmt::Display for ServiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceName(pub String);

impl DeviceName {
    pub fn new(s: impl Into<String>) -> Self {
        DeviceName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceUuid(pub Uuid);

impl ServiceUuid {
    pub fn new() -> Self {
        ServiceUuid(Uuid::new_v4())
    }
}

impl Default for ServiceUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ServiceUuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Enums ─────────────────────────────────────────────────────────────────────

/// Lifecycle of a `ServiceAttr` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Creating,
    Initializing,
    Active,
    Deleting,
    Deleted,
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ServiceStatus::Creating => "CREATING",
            ServiceStatus::Initializing => "INITIALIZING",
            ServiceStatus::Active => "ACTIVE",
            ServiceStatus::Deleting => "DELETING",
            ServiceStatus::Deleted => "DELETED",
        };
        write!(f, "{}", s)
    }
}

/// Whether a service carries persistent per-member volumes/identity or not.
/// Stateless services (e.g. kafkamanager) never carry a journal device —
/// stateless services reject journal volumes at request-validation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Stateful,
    Stateless,
}

/// Member lifecycle status, mirroring the original `ServiceMemberStatus*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberStatus {
    Active,
    Pause,
    #[serde(rename = "Bad")]
    Bad,
}

/// The catalog-level service types this control plane provisions for.
/// `UserAttr.attr_bytes` is opaque to everything below the catalog layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogServiceType {
    #[serde(rename = "mongodb")]
    MongoDb,
    #[serde(rename = "postgresql")]
    PostgreSql,
    Cassandra,
    #[serde(rename = "zookeeper")]
    ZooKeeper,
    Kafka,
    #[serde(rename = "kafkamanager")]
    KafkaManager,
    #[serde(rename = "kafkasinkes")]
    KafkaSinkEs,
    Redis,
    #[serde(rename = "couchdb")]
    CouchDb,
    Consul,
    #[serde(rename = "elasticsearch")]
    ElasticSearch,
    Kibana,
    Logstash,
    Telegraf,
}

/// Volume type; only `Io1` honors `ServiceVolume::iops`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeType {
    /// General Purpose SSD.
    #[serde(rename = "gp2")]
    Gp2,
    /// Provisioned IOPS SSD.
    #[serde(rename = "io1")]
    Io1,
    /// Throughput Optimized HDD.
    #[serde(rename = "st1")]
    St1,
}

// ── Value types ───────────────────────────────────────────────────────────────

/// CPU/memory reservation for a service's containers. `-1` means unlimited,
/// matching the original `Resources` semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub max_cpu_units: i64,
    pub reserve_cpu_units: i64,
    pub max_mem_mb: i64,
    pub reserve_mem_mb: i64,
}

impl Default for Resources {
    fn default() -> Self {
        Resources {
            max_cpu_units: -1,
            reserve_cpu_units: -1,
            max_mem_mb: -1,
            reserve_mem_mb: -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceVolume {
    pub volume_type: VolumeType,
    pub volume_size_gb: i64,
    /// Only meaningful when `volume_type == Io1`.
    pub iops: i64,
    pub encrypted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceVolumes {
    pub primary_device_name: DeviceName,
    pub primary_volume: ServiceVolume,
    pub journal_device_name: Option<DeviceName>,
    pub journal_volume: Option<ServiceVolume>,
}

impl ServiceVolumes {
    pub fn has_journal(&self) -> bool {
        self.journal_device_name.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceUserAttr {
    pub service_type: CatalogServiceType,
    /// Opaque to everything below the catalog layer; persisted verbatim.
    pub attr_bytes: Vec<u8>,
}

// ── Core entities ───────────────────────────────────────────────────────────

/// Identity `(ClusterName, DeviceName)`; a DeviceName is assigned to at most
/// one ServiceName per cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub cluster_name: ClusterName,
    pub device_name: DeviceName,
    pub service_name: ServiceName,
}

/// Identity `(ClusterName, ServiceName)`; the name→UUID index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub cluster_name: ClusterName,
    pub service_name: ServiceName,
    pub service_uuid: ServiceUuid,
}

/// Identity `ServiceUuid`. Mutated only via conditional update supplying the
/// prior full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAttr {
    pub service_uuid: ServiceUuid,
    pub status: ServiceStatus,
    pub replicas: u32,
    pub cluster_name: ClusterName,
    pub service_name: ServiceName,
    pub volumes: ServiceVolumes,
    pub register_dns: bool,
    pub domain_name: String,
    pub hosted_zone_id: String,
    pub require_static_ip: bool,
    pub resource: Resources,
    pub user_attr: ServiceUserAttr,
    pub service_type: ServiceType,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberVolumes {
    pub primary_volume_id: String,
    pub primary_device_name: DeviceName,
    pub journal_volume_id: Option<String>,
    pub journal_device_name: Option<DeviceName>,
}

impl MemberVolumes {
    /// True once every volume this member requires has a recorded ID —
    /// used by the Member Builder's resume check.
    pub fn is_complete(&self, requires_journal: bool) -> bool {
        !self.primary_volume_id.is_empty()
            && (!requires_journal || self.journal_volume_id.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberConfig {
    pub file_name: String,
    pub file_id: Uuid,
    pub file_md5: String,
}

/// Identity `(ServiceUuid, MemberIndex)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMember {
    pub service_uuid: ServiceUuid,
    pub member_index: u32,
    pub status: MemberStatus,
    pub member_name: String,
    pub available_zone: String,
    pub task_id: String,
    pub container_instance_id: String,
    pub server_instance_id: String,
    pub volumes: MemberVolumes,
    pub static_ip: Option<String>,
    pub configs: Vec<MemberConfig>,
    pub last_modified: DateTime<Utc>,
}

/// Identity `(ServiceUuid, FileId)`. Immutable after creation — updating
/// configuration means creating a new ConfigFile and repointing the member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub service_uuid: ServiceUuid,
    pub file_id: Uuid,
    pub file_name: String,
    pub file_md5: String,
    pub file_mode: u32,
    pub content: String,
    pub last_modified: DateTime<Utc>,
}

/// Identity `StaticIp`; owned by exactly one `ServiceUuid` while assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStaticIp {
    pub static_ip: String,
    pub service_uuid: ServiceUuid,
    pub available_zone: String,
    pub server_instance_id: String,
    pub network_interface_id: String,
}

// ── Create-service request ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicaConfig {
    pub file_name: String,
    pub content: String,
    pub file_mode: u32,
    /// Required when the service requires a static IP.
    pub zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeSpec {
    pub primary_volume: ServiceVolume,
    pub journal_volume: Option<ServiceVolume>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceRequest {
    pub cluster_name: ClusterName,
    pub service_name: ServiceName,
    pub replicas: u32,
    pub replica_configs: Vec<ReplicaConfig>,
    pub register_dns: bool,
    pub require_static_ip: bool,
    pub resource: Resources,
    pub user_attr: ServiceUserAttr,
    pub service_type: ServiceType,
    pub volumes: VolumeSpec,
}

impl CreateServiceRequest {
    /// Step 1 of the Service Creation Pipeline.
    pub fn validate(&self) -> Result<(), DomainError> {
        self.service_name.validate()?;
        if self.replicas < 1 {
            return Err(DomainError::InvalidReplicas(self.replicas as i64));
        }
        if self.replica_configs.len() != self.replicas as usize {
            return Err(DomainError::ReplicaConfigCountMismatch {
                expected: self.replicas as usize,
                got: self.replica_configs.len(),
            });
        }
        if self.require_static_ip {
            for (idx, rc) in self.replica_configs.iter().enumerate() {
                if rc.zone.as_deref().unwrap_or("").is_empty() {
                    return Err(DomainError::MissingZone(idx as u32));
                }
            }
        }
        if self.service_type == ServiceType::Stateless && self.volumes.journal_volume.is_some() {
            return Err(DomainError::StatelessJournalNotAllowed);
        }
        Ok(())
    }
}

pub fn member_name(service_name: &ServiceName, index: u32) -> String {
    format!("{}-{}", service_name.as_str(), index)
}

pub fn primary_mount_path(uuid: &ServiceUuid) -> String {
    format!("/mnt/{}", uuid)
}

pub fn journal_mount_path(uuid: &ServiceUuid) -> String {
    format!("/mnt/journal-{}", uuid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_name_accepts_letters_digits_hyphen() {
        assert!(ServiceName::new("my-service2").validate().is_ok());
    }

    #[test]
    fn service_name_rejects_leading_digit() {
        assert!(ServiceName::new("2service").validate().is_err());
    }

    #[test]
    fn service_name_rejects_empty() {
        assert!(ServiceName::new("").validate().is_err());
    }

    #[test]
    fn member_name_formats_index() {
        assert_eq!(member_name(&ServiceName::new("pg"), 2), "pg-2");
    }

    #[test]
    fn stateless_with_journal_is_rejected() {
        let req = sample_request(ServiceType::Stateless, Some(sample_volume()));
        assert!(matches!(
            req.validate(),
            Err(DomainError::StatelessJournalNotAllowed)
        ));
    }

    #[test]
    fn static_ip_without_zone_is_rejected() {
        let mut req = sample_request(ServiceType::Stateful, None);
        req.require_static_ip = true;
        req.replica_configs[0].zone = None;
        assert!(matches!(req.validate(), Err(DomainError::MissingZone(0))));
    }

    fn sample_volume() -> ServiceVolume {
        ServiceVolume {
            volume_type: VolumeType::Gp2,
            volume_size_gb: 10,
            iops: 0,
            encrypted: false,
        }
    }

    fn sample_request(service_type: ServiceType, journal: Option<ServiceVolume>) -> CreateServiceRequest {
        CreateServiceRequest {
            cluster_name: ClusterName::new("cluster1"),
            service_name: ServiceName::new("svc"),
            replicas: 1,
            replica_configs: vec![ReplicaConfig {
                file_name: "a.conf".into(),
                content: "x".into(),
                file_mode: 0o644,
                zone: Some("az-west".into()),
            }],
            register_dns: false,
            require_static_ip: false,
            resource: Resources::default(),
            user_attr: ServiceUserAttr {
                service_type: CatalogServiceType::Redis,
                attr_bytes: vec![],
            },
            service_type,
            volumes: VolumeSpec {
                primary_volume: sample_volume(),
                journal_volume: journal,
            },
        }
    }
}
