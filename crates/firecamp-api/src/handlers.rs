use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use firecamp_control::{create_service, delete_service, get_service_by_name, list_service_members, set_service_initialized};
use firecamp_domain::{ClusterName, CreateServiceRequest, ServiceName};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn ready(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state
        .store
        .list_services(&ClusterName::new(""), 1, None)
        .await
        .map_err(firecamp_control::ControlError::from)?;
    Ok(StatusCode::OK)
}

pub async fn post_create_service(
    State(state): State<AppState>,
    Json(req): Json<CreateServiceRequest>,
) -> Result<Json<Value>, ApiError> {
    let uuid = create_service(
        state.store.as_ref(),
        &state.drivers,
        &req,
        &state.domain,
        &state.vpc_id,
        &state.region,
    )
    .await?;
    Ok(Json(json!({ "service_uuid": uuid.0 })))
}

pub async fn get_service(
    State(state): State<AppState>,
    Path((cluster, name)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let attr = get_service_by_name(
        state.store.as_ref(),
        &ClusterName::new(cluster),
        &ServiceName::new(name),
    )
    .await?;
    Ok(Json(json!(attr)))
}

pub async fn get_service_members(
    State(state): State<AppState>,
    Path((cluster, name)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let attr = get_service_by_name(
        state.store.as_ref(),
        &ClusterName::new(cluster),
        &ServiceName::new(name),
    )
    .await?;
    let members = list_service_members(state.store.as_ref(), attr.service_uuid).await?;
    Ok(Json(json!(members)))
}

pub async fn post_set_initialized(
    State(state): State<AppState>,
    Path((cluster, name)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    set_service_initialized(
        state.store.as_ref(),
        &ClusterName::new(cluster),
        &ServiceName::new(name),
    )
    .await?;
    Ok(StatusCode::OK)
}

pub async fn delete_service_handler(
    State(state): State<AppState>,
    Path((cluster, name)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let deleted_volumes = delete_service(
        state.store.as_ref(),
        &state.drivers,
        &ClusterName::new(cluster),
        &ServiceName::new(name),
    )
    .await?;
    Ok(Json(json!({ "deleted_volumes": deleted_volumes })))
}
