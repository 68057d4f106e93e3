use chrono::Utc;
use firecamp_domain::{MemberConfig, ReplicaConfig, ServiceUuid};
use firecamp_store::MetadataStore;
use md5::{Digest, Md5};
use uuid::Uuid;

use crate::error::ControlError;

fn file_md5(content: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Creates a fresh `ConfigFile` for one replica's configuration and returns
/// the `MemberConfig` reference to it.
///
/// Callers resolve resume first: if the `ServiceMember` already exists, its
/// `configs[]` is the authoritative reference and this function is never
/// called — regenerating a `ConfigFile` here only happens on a fresh build,
/// so a `FileId` collision with a prior aborted attempt is impossible.
pub async fn ensure_config_file(
    store: &dyn MetadataStore,
    service_uuid: ServiceUuid,
    replica: &ReplicaConfig,
) -> Result<MemberConfig, ControlError> {
    let file_id = Uuid::new_v4();
    let md5 = file_md5(&replica.content);

    let cf = firecamp_domain::ConfigFile {
        service_uuid,
        file_id,
        file_name: replica.file_name.clone(),
        file_md5: md5.clone(),
        file_mode: replica.file_mode,
        content: replica.content.clone(),
        last_modified: Utc::now(),
    };
    store.create_config_file(&cf).await?;

    Ok(MemberConfig {
        file_name: replica.file_name.clone(),
        file_id,
        file_md5: md5,
    })
}
