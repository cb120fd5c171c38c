//! Shared application state for axum handlers.

use std::sync::Arc;

use tally_app::ports::DeviceStore;
use tally_app::services::telemetry_service::TelemetryService;

/// Application state shared across all axum handlers.
///
/// Generic over the store type to avoid dynamic dispatch. `Clone` is
/// implemented manually so the store itself does not need to be `Clone` —
/// only the `Arc` wrapper is cloned.
pub struct AppState<S> {
    /// Ingest and query service.
    pub telemetry_service: Arc<TelemetryService<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            telemetry_service: Arc::clone(&self.telemetry_service),
        }
    }
}

impl<S> AppState<S>
where
    S: DeviceStore + Send + Sync + 'static,
{
    /// Create a new application state from a service instance.
    pub fn new(telemetry_service: TelemetryService<S>) -> Self {
        Self {
            telemetry_service: Arc::new(telemetry_service),
        }
    }
}
