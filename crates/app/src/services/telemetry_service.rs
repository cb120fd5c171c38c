//! Telemetry service — ingest readings and query per-device aggregates.

use tally_domain::device::DeviceSnapshot;
use tally_domain::error::{NotFoundError, TallyError};
use tally_domain::id::DeviceId;
use tally_domain::reading::Reading;
use tally_domain::time::Timestamp;

use crate::ports::DeviceStore;

/// Application service in front of a [`DeviceStore`].
pub struct TelemetryService<S> {
    store: S,
}

impl<S: DeviceStore> TelemetryService<S> {
    /// Create a new service backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Append a batch of readings for `device_id`.
    ///
    /// Readings are applied in order. The batch stops at the first rejected
    /// reading; the ones accepted before it are kept.
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::Validation`] when `device_id` is empty (the
    /// store is not touched), or [`TallyError::Rejected`] when a reading is a
    /// duplicate or would overflow the device's sum.
    #[tracing::instrument(skip(self, readings), fields(readings = readings.len()))]
    pub async fn ingest(&self, device_id: &str, readings: &[Reading]) -> Result<(), TallyError> {
        let id = DeviceId::new(device_id)?;
        match self.store.ingest(&id, readings).await {
            Ok(()) => {
                tracing::debug!("batch accepted");
                Ok(())
            }
            Err(TallyError::Rejected(err)) => {
                tracing::warn!(
                    applied = err.applied(),
                    timestamp = %err.timestamp(),
                    reason = %err,
                    "batch rejected"
                );
                Err(err.into())
            }
            Err(err) => Err(err),
        }
    }

    /// All aggregates of a device, taken from one consistent snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::NotFound`] when the device was never ingested
    /// into, or an error propagated from the store.
    #[tracing::instrument(skip(self))]
    pub async fn summary(&self, device_id: &str) -> Result<DeviceSnapshot, TallyError> {
        let not_found = || -> TallyError {
            NotFoundError {
                entity: "device",
                id: device_id.to_string(),
            }
            .into()
        };
        // no record can exist under an empty id
        let Ok(id) = DeviceId::new(device_id) else {
            return Err(not_found());
        };
        self.store.snapshot(&id).await?.ok_or_else(not_found)
    }

    /// Sum of all accepted counts for a device.
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::NotFound`] when the device is unknown.
    pub async fn cumulative(&self, device_id: &str) -> Result<i64, TallyError> {
        self.summary(device_id).await.map(|snap| snap.cumulative)
    }

    /// Greatest accepted timestamp for a device.
    ///
    /// # Errors
    ///
    /// Returns [`TallyError::NotFound`] when the device is unknown.
    pub async fn latest(&self, device_id: &str) -> Result<Timestamp, TallyError> {
        self.summary(device_id).await.map(|snap| snap.latest)
    }
}
