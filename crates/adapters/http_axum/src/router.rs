//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use tally_app::ports::DeviceStore;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests API routes under `/v1` and adds `/health`.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<S>(state: AppState<S>) -> Router
where
    S: DeviceStore + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/v1", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
