use serde::{Deserialize, Serialize};

/// Raw YAML representation of a `CreateService` request file.
#[derive(Debug, Deserialize, Serialize)]
pub struct RawCreateServiceRequest {
    pub cluster_name: String,
    pub service_name: String,
    pub replicas: u32,
    pub replica_configs: Vec<RawReplicaConfig>,
    #[serde(default)]
    pub register_dns: bool,
    #[serde(default)]
    pub require_static_ip: bool,
    #[serde(default)]
    pub resource: Option<RawResources>,
    /// One of `stateful` / `stateless`.
    pub service_type: String,
    /// Catalog service, e.g. `mongodb`, `redis`, `kafkamanager`.
    pub catalog_type: String,
    /// Opaque catalog-specific attributes, persisted verbatim as UTF-8 bytes.
    #[serde(default)]
    pub attr: String,
    pub volumes: RawVolumeSpec,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RawReplicaConfig {
    pub file_name: String,
    pub content: String,
    #[serde(default = "default_file_mode")]
    pub file_mode: u32,
    pub zone: Option<String>,
}

fn default_file_mode() -> u32 {
    0o644
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RawResources {
    #[serde(default = "default_unlimited")]
    pub max_cpu_units: i64,
    #[serde(default = "default_unlimited")]
    pub reserve_cpu_units: i64,
    #[serde(default = "default_unlimited")]
    pub max_mem_mb: i64,
    #[serde(default = "default_unlimited")]
    pub reserve_mem_mb: i64,
}

fn default_unlimited() -> i64 {
    -1
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RawVolumeSpec {
    pub primary_volume: RawServiceVolume,
    pub journal_volume: Option<RawServiceVolume>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RawServiceVolume {
    /// One of `gp2` / `io1` / `st1`.
    pub volume_type: String,
    pub volume_size_gb: i64,
    #[serde(default)]
    pub iops: i64,
    #[serde(default)]
    pub encrypted: bool,
}
