use std::sync::Arc;

use firecamp_driver::DriverRegistry;
use firecamp_store::MetadataStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MetadataStore>,
    pub drivers: Arc<DriverRegistry>,
    pub auth_token: Arc<String>,
    pub domain: Arc<String>,
    pub vpc_id: Arc<String>,
    pub region: Arc<String>,
}
