//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod devices;

use axum::Router;
use axum::routing::{get, post};

use tally_app::ports::DeviceStore;

use crate::state::AppState;

/// Build the `/v1` sub-router.
pub fn routes<S>() -> Router<AppState<S>>
where
    S: DeviceStore + Send + Sync + 'static,
{
    Router::new()
        .route("/devices", post(devices::ingest::<S>))
        .route("/devices/{id}", get(devices::get::<S>))
        .route("/devices/{id}/cumulative", get(devices::cumulative::<S>))
        .route("/devices/{id}/latest", get(devices::latest::<S>))
}
