//! JSON REST handlers for device telemetry.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use tally_app::ports::DeviceStore;
use tally_domain::device::DeviceSnapshot;
use tally_domain::reading::Reading;
use tally_domain::time::Timestamp;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for ingesting readings.
///
/// Both fields may be absent or `null`; presence is checked by the service.
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub readings: Option<Vec<Reading>>,
}

#[derive(Debug, Serialize)]
pub struct IngestAccepted {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct CumulativeBody {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct LatestBody {
    pub latest_timestamp: Timestamp,
}

/// Possible responses from the ingest endpoint.
pub enum IngestResponse {
    Created(Json<IngestAccepted>),
}

impl IntoResponse for IngestResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<DeviceSnapshot>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the cumulative endpoint.
pub enum CumulativeResponse {
    Ok(Json<CumulativeBody>),
}

impl IntoResponse for CumulativeResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the latest endpoint.
pub enum LatestResponse {
    Ok(Json<LatestBody>),
}

impl IntoResponse for LatestResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `POST /v1/devices`
///
/// The body is decoded as JSON whatever the `Content-Type` header says.
pub async fn ingest<S>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Result<IngestResponse, ApiError>
where
    S: DeviceStore + Send + Sync + 'static,
{
    let req: IngestRequest = serde_json::from_slice(&body).map_err(ApiError::InvalidBody)?;
    let id = req.id.unwrap_or_default();
    let readings = req.readings.unwrap_or_default();

    state.telemetry_service.ingest(&id, &readings).await?;
    Ok(IngestResponse::Created(Json(IngestAccepted { success: true })))
}

/// `GET /v1/devices/{id}`
pub async fn get<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    S: DeviceStore + Send + Sync + 'static,
{
    let summary = state.telemetry_service.summary(&id).await?;
    Ok(GetResponse::Ok(Json(summary)))
}

/// `GET /v1/devices/{id}/cumulative`
pub async fn cumulative<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<CumulativeResponse, ApiError>
where
    S: DeviceStore + Send + Sync + 'static,
{
    let count = state.telemetry_service.cumulative(&id).await?;
    Ok(CumulativeResponse::Ok(Json(CumulativeBody { count })))
}

/// `GET /v1/devices/{id}/latest`
pub async fn latest<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<LatestResponse, ApiError>
where
    S: DeviceStore + Send + Sync + 'static,
{
    let latest_timestamp = state.telemetry_service.latest(&id).await?;
    Ok(LatestResponse::Ok(Json(LatestBody { latest_timestamp })))
}
