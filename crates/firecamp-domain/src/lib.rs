mod error;
mod types;

pub use error::DomainError;
pub use types::{
    journal_mount_path, member_name, primary_mount_path, CatalogServiceType, ClusterName,
    ConfigFile, CreateServiceRequest, Device, DeviceName, MemberConfig, MemberStatus,
    MemberVolumes, ReplicaConfig, Resources, Service, ServiceAttr, ServiceMember, ServiceName,
    ServiceStaticIp, ServiceStatus, ServiceType, ServiceUserAttr, ServiceUuid, ServiceVolume,
    ServiceVolumes, VolumeSpec, VolumeType,
};
