//! Storage port — the per-device aggregate registry.

use std::future::Future;

use tally_domain::device::DeviceSnapshot;
use tally_domain::error::TallyError;
use tally_domain::id::DeviceId;
use tally_domain::reading::Reading;

/// Concurrent registry of device records.
///
/// Implementations must guarantee that:
/// - one `ingest` call runs its whole batch under exclusive access to the
///   device's record, so racing calls for the same device never interleave;
/// - two racing first ingests for an unseen id converge on a single record;
/// - a device becomes visible to `snapshot` only with its first batch
///   applied, and an ingest future dropped before completion never leaves
///   an empty record behind;
/// - `snapshot` observes either the state before or after an in-flight
///   batch, never a mix.
pub trait DeviceStore {
    /// Apply `readings` in order to the record for `device_id`, creating it
    /// on first touch. Stops at the first rejected reading and keeps the ones
    /// accepted before it.
    ///
    /// An empty batch is a no-op and does not create a record.
    fn ingest(
        &self,
        device_id: &DeviceId,
        readings: &[Reading],
    ) -> impl Future<Output = Result<(), TallyError>> + Send;

    /// Copy the aggregates of `device_id`, or `None` if the device was never
    /// ingested into.
    fn snapshot(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<DeviceSnapshot>, TallyError>> + Send;
}
