use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use firecamp_domain::{ClusterName, ServiceName};
use firecamp_driver::DriverRegistry;
use firecamp_store::{list_all, MemoryStore, MetadataStore, RedbStore};

use crate::output::print_json;

fn open_store(path: &Path, ephemeral: bool) -> Result<Arc<dyn MetadataStore>> {
    if ephemeral {
        println!("Using in-memory (ephemeral) store — state will be lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    }
    Ok(Arc::new(
        RedbStore::open(path).with_context(|| format!("failed to open store at {}", path.display()))?,
    ))
}

pub async fn create(
    store_path: PathBuf,
    request: PathBuf,
    domain: String,
    vpc_id: String,
    region: String,
) -> Result<()> {
    let req = firecamp_config::load_request(&request)
        .with_context(|| format!("failed to load request from {}", request.display()))?;
    let store = open_store(&store_path, false)?;
    let drivers = DriverRegistry::local();

    let uuid =
        firecamp_control::create_service(store.as_ref(), &drivers, &req, &domain, &vpc_id, &region)
            .await
            .context("create_service failed")?;
    println!("service created: {uuid}");
    Ok(())
}

pub async fn delete(store_path: PathBuf, cluster: String, service: String) -> Result<()> {
    let store = open_store(&store_path, false)?;
    let drivers = DriverRegistry::local();
    let deleted = firecamp_control::delete_service(
        store.as_ref(),
        &drivers,
        &ClusterName::new(cluster),
        &ServiceName::new(service),
    )
    .await
    .context("delete_service failed")?;
    println!("deleted {} volume(s)", deleted.len());
    Ok(())
}

pub async fn init(store_path: PathBuf, cluster: String, service: String) -> Result<()> {
    let store = open_store(&store_path, false)?;
    firecamp_control::set_service_initialized(
        store.as_ref(),
        &ClusterName::new(cluster),
        &ServiceName::new(service),
    )
    .await
    .context("set_service_initialized failed")?;
    println!("service marked initialized");
    Ok(())
}

pub async fn get(store_path: PathBuf, cluster: String, service: String) -> Result<()> {
    let store = open_store(&store_path, false)?;
    let cluster = ClusterName::new(cluster);
    let service = ServiceName::new(service);
    let attr = firecamp_control::get_service_by_name(store.as_ref(), &cluster, &service)
        .await
        .context("get_service failed")?;
    let members = firecamp_control::list_service_members(store.as_ref(), attr.service_uuid)
        .await
        .context("list_service_members failed")?;
    print_json(&serde_json::json!({ "attr": attr, "members": members }));
    Ok(())
}

pub async fn list(store_path: PathBuf, cluster: String) -> Result<()> {
    let store = open_store(&store_path, false)?;
    let cluster = ClusterName::new(cluster);
    let services = list_all(|token| store.list_services(&cluster, 0, token))
        .await
        .context("list_services failed")?;
    print_json(&services);
    Ok(())
}

pub struct BootstrapOpts {
    pub store_path: PathBuf,
    pub bind: String,
    pub port: u16,
    pub auth_token: Option<String>,
    pub domain: String,
    pub vpc_id: String,
    pub region: String,
    pub ephemeral: bool,
}

pub async fn bootstrap(opts: BootstrapOpts) -> Result<()> {
    let store = open_store(&opts.store_path, opts.ephemeral)?;
    let drivers = Arc::new(DriverRegistry::local());
    let token = opts.auth_token.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    println!("Auth token: {token}");

    let addr = format!("{}:{}", opts.bind, opts.port);
    let app = firecamp_api::build_app(store, drivers, Arc::new(token), opts.domain, opts.vpc_id, opts.region);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    println!("Starting firecamp API server on http://{addr}");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
