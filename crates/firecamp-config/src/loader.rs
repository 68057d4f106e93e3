use std::path::Path;

use firecamp_domain::{
    CatalogServiceType, ClusterName, CreateServiceRequest, Resources, ServiceName, ServiceType,
    ServiceUserAttr, ServiceVolume, VolumeSpec, VolumeType,
};
use tracing::debug;

use crate::error::ConfigError;
use crate::raw::{RawCreateServiceRequest, RawReplicaConfig, RawResources, RawServiceVolume};

/// Load and validate a `CreateService` request from a YAML file.
///
/// A raw deserialization pass, then a conversion pass that maps strings to
/// domain enums and runs `CreateServiceRequest::validate`.
pub fn load_request(path: &Path) -> Result<CreateServiceRequest, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    debug!(path = %path.display(), "loading create-service request");
    let raw: RawCreateServiceRequest =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
            path: path.display().to_string(),
            source: e,
        })?;
    convert_request(raw, path)
}

/// Parse a request from an in-memory YAML string (used by tests and
/// anywhere a request doesn't live on disk).
pub fn parse_request_yaml(content: &str) -> Result<CreateServiceRequest, ConfigError> {
    let raw: RawCreateServiceRequest =
        serde_yaml::from_str(content).map_err(|e| ConfigError::YamlParse {
            path: "<string>".to_string(),
            source: e,
        })?;
    convert_request(raw, Path::new("<string>"))
}

fn convert_request(
    raw: RawCreateServiceRequest,
    path: &Path,
) -> Result<CreateServiceRequest, ConfigError> {
    let service_type = parse_service_type(&raw.service_type, path)?;
    let catalog_type = parse_catalog_type(&raw.catalog_type, path)?;

    let replica_configs = raw
        .replica_configs
        .into_iter()
        .map(convert_replica_config)
        .collect();

    let volumes = VolumeSpec {
        primary_volume: convert_volume(raw.volumes.primary_volume, path)?,
        journal_volume: raw
            .volumes
            .journal_volume
            .map(|v| convert_volume(v, path))
            .transpose()?,
    };

    let req = CreateServiceRequest {
        cluster_name: ClusterName::new(raw.cluster_name),
        service_name: ServiceName::new(raw.service_name),
        replicas: raw.replicas,
        replica_configs,
        register_dns: raw.register_dns,
        require_static_ip: raw.require_static_ip,
        resource: convert_resources(raw.resource),
        user_attr: ServiceUserAttr {
            service_type: catalog_type,
            attr_bytes: raw.attr.into_bytes(),
        },
        service_type,
        volumes,
    };

    req.validate()?;
    Ok(req)
}

fn convert_replica_config(raw: RawReplicaConfig) -> firecamp_domain::ReplicaConfig {
    firecamp_domain::ReplicaConfig {
        file_name: raw.file_name,
        content: raw.content,
        file_mode: raw.file_mode,
        zone: raw.zone,
    }
}

fn convert_resources(raw: Option<RawResources>) -> Resources {
    match raw {
        None => Resources::default(),
        Some(r) => Resources {
            max_cpu_units: r.max_cpu_units,
            reserve_cpu_units: r.reserve_cpu_units,
            max_mem_mb: r.max_mem_mb,
            reserve_mem_mb: r.reserve_mem_mb,
        },
    }
}

fn convert_volume(raw: RawServiceVolume, path: &Path) -> Result<ServiceVolume, ConfigError> {
    Ok(ServiceVolume {
        volume_type: parse_volume_type(&raw.volume_type, path)?,
        volume_size_gb: raw.volume_size_gb,
        iops: raw.iops,
        encrypted: raw.encrypted,
    })
}

fn parse_service_type(s: &str, path: &Path) -> Result<ServiceType, ConfigError> {
    match s {
        "stateful" => Ok(ServiceType::Stateful),
        "stateless" => Ok(ServiceType::Stateless),
        other => Err(ConfigError::Conversion {
            path: path.display().to_string(),
            message: format!("unknown service_type '{}'", other),
        }),
    }
}

fn parse_catalog_type(s: &str, path: &Path) -> Result<CatalogServiceType, ConfigError> {
    match s {
        "mongodb" => Ok(CatalogServiceType::MongoDb),
        "postgresql" => Ok(CatalogServiceType::PostgreSql),
        "cassandra" => Ok(CatalogServiceType::Cassandra),
        "zookeeper" => Ok(CatalogServiceType::ZooKeeper),
        "kafka" => Ok(CatalogServiceType::Kafka),
        "kafkamanager" => Ok(CatalogServiceType::KafkaManager),
        "kafkasinkes" => Ok(CatalogServiceType::KafkaSinkEs),
        "redis" => Ok(CatalogServiceType::Redis),
        "couchdb" => Ok(CatalogServiceType::CouchDb),
        "consul" => Ok(CatalogServiceType::Consul),
        "elasticsearch" => Ok(CatalogServiceType::ElasticSearch),
        "kibana" => Ok(CatalogServiceType::Kibana),
        "logstash" => Ok(CatalogServiceType::Logstash),
        "telegraf" => Ok(CatalogServiceType::Telegraf),
        other => Err(ConfigError::Conversion {
            path: path.display().to_string(),
            message: format!("unknown catalog_type '{}'", other),
        }),
    }
}

fn parse_volume_type(s: &str, path: &Path) -> Result<VolumeType, ConfigError> {
    match s {
        "gp2" => Ok(VolumeType::Gp2),
        "io1" => Ok(VolumeType::Io1),
        "st1" => Ok(VolumeType::St1),
        other => Err(ConfigError::Conversion {
            path: path.display().to_string(),
            message: format!("unknown volume_type '{}'", other),
        }),
    }
}
