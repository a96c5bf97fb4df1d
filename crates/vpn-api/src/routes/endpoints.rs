use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use vpn_core::Endpoint;

use crate::dto::{CreateEndpointRequest, RestoreResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn create_endpoint(
    State(state): State<AppState>,
    Json(req): Json<CreateEndpointRequest>,
) -> Result<(StatusCode, Json<Endpoint>), ApiError> {
    let region = req.region.trim();
    if region.is_empty() {
        return Err(ApiError::BadRequest("region must not be empty".into()));
    }

    let endpoint = state.service.create_endpoint(region).await?;
    Ok((StatusCode::ACCEPTED, Json(endpoint)))
}

pub async fn list_endpoints(State(state): State<AppState>) -> Json<Vec<Endpoint>> {
    Json(state.service.list_endpoints().await)
}

pub async fn get_endpoint(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Endpoint>, ApiError> {
    Ok(Json(state.service.get_endpoint(&id).await?))
}

pub async fn destroy_endpoint(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Endpoint>, ApiError> {
    Ok(Json(state.service.destroy_endpoint(&id).await?))
}

/// Re-run the restore scan on demand.
pub async fn restore_endpoints(
    State(state): State<AppState>,
) -> Result<Json<RestoreResponse>, ApiError> {
    let adopted = state.service.restore().await?;
    Ok(Json(RestoreResponse { adopted }))
}
