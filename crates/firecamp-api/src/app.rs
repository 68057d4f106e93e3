use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use firecamp_driver::DriverRegistry;
use firecamp_store::MetadataStore;
use tower_http::trace::TraceLayer;

use crate::auth::require_bearer_token;
use crate::handlers;
use crate::state::AppState;

pub fn build_app(
    store: Arc<dyn MetadataStore>,
    drivers: Arc<DriverRegistry>,
    auth_token: Arc<String>,
    domain: String,
    vpc_id: String,
    region: String,
) -> Router {
    let state = AppState {
        store,
        drivers,
        auth_token,
        domain: Arc::new(domain),
        vpc_id: Arc::new(vpc_id),
        region: Arc::new(region),
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/services", post(handlers::post_create_service))
        .route(
            "/services/:cluster/:name",
            get(handlers::get_service).delete(handlers::delete_service_handler),
        )
        .route("/services/:cluster/:name/members", get(handlers::get_service_members))
        .route("/services/:cluster/:name/initialized", post(handlers::post_set_initialized))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer_token))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use firecamp_domain::{
        CatalogServiceType, ClusterName, CreateServiceRequest, Resources, ServiceName,
        ServiceType, ServiceUserAttr, ServiceVolume, VolumeSpec, VolumeType,
    };
    use firecamp_store::MemoryStore;
    use tower::util::ServiceExt;

    const TEST_TOKEN: &str = "test-token";

    fn test_app() -> Router {
        let store: Arc<dyn MetadataStore> = Arc::new(MemoryStore::new());
        let drivers = Arc::new(DriverRegistry::local());
        build_app(
            store,
            drivers,
            Arc::new(TEST_TOKEN.to_string()),
            "example.com".into(),
            "vpc-1".into(),
            "us-east-1".into(),
        )
    }

    fn authed(req: axum::http::request::Builder) -> axum::http::request::Builder {
        req.header("Authorization", format!("Bearer {}", TEST_TOKEN))
    }

    fn sample_request() -> CreateServiceRequest {
        CreateServiceRequest {
            cluster_name: ClusterName::new("test-cluster"),
            service_name: ServiceName::new("apiredis"),
            replicas: 1,
            replica_configs: vec![firecamp_domain::ReplicaConfig {
                file_name: "redis.conf".into(),
                content: "port 6379".into(),
                file_mode: 0o644,
                zone: None,
            }],
            register_dns: false,
            require_static_ip: false,
            resource: Resources::default(),
            user_attr: ServiceUserAttr { service_type: CatalogServiceType::Redis, attr_bytes: vec![] },
            service_type: ServiceType::Stateful,
            volumes: VolumeSpec {
                primary_volume: ServiceVolume {
                    volume_type: VolumeType::Gp2,
                    volume_size_gb: 10,
                    iops: 0,
                    encrypted: true,
                },
                journal_volume: None,
            },
        }
    }

    #[tokio::test]
    async fn unauthenticated_request_returns_401() {
        let app = test_app();
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_returns_200() {
        let app = test_app();
        let resp = app
            .oneshot(authed(Request::builder().uri("/health")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn service_not_found_returns_404() {
        let app = test_app();
        let resp = app
            .oneshot(
                authed(Request::builder().uri("/services/test-cluster/nonexistent"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_then_get_service_roundtrips() {
        let app = test_app();
        let body = serde_json::to_string(&sample_request()).unwrap();

        let create_resp = app
            .clone()
            .oneshot(
                authed(Request::builder().method("POST").uri("/services"))
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(create_resp.status(), StatusCode::OK);

        let get_resp = app
            .oneshot(
                authed(Request::builder().uri("/services/test-cluster/apiredis"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(get_resp.status(), StatusCode::OK);
    }
}
