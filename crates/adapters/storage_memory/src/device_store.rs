//! In-memory implementation of [`DeviceStore`].

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{Mutex, OwnedMutexGuard};

use tally_app::ports::DeviceStore;
use tally_domain::device::{DeviceRecord, DeviceSnapshot};
use tally_domain::error::TallyError;
use tally_domain::id::DeviceId;
use tally_domain::reading::Reading;

type SharedRecord = Arc<Mutex<DeviceRecord>>;

enum Claim {
    /// The record was just registered and is published already locked.
    Created(OwnedMutexGuard<DeviceRecord>),
    Existing(SharedRecord),
}

/// Process-lifetime registry of device records.
///
/// The map only hands out `Arc`s to per-device mutexes; shard guards are
/// never held across an `.await`. A batch locks its device's mutex for the
/// whole call, so batches for one device are serialized while batches for
/// different devices run in parallel.
#[derive(Default)]
pub struct InMemoryDeviceStore {
    devices: DashMap<DeviceId, SharedRecord>,
}

impl InMemoryDeviceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of known devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Look up the record for `device_id`, registering a locked empty one if
    /// missing.
    ///
    /// The entry API holds the shard lock across lookup and insert, so racing
    /// callers for a new id all get the same record. A new record is locked
    /// before it is inserted: readers block on it until the creating batch is
    /// applied, and never observe it empty.
    fn claim(&self, device_id: &DeviceId) -> Claim {
        match self.devices.entry(device_id.clone()) {
            Entry::Occupied(entry) => Claim::Existing(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                tracing::debug!(device_id = %device_id, "registering device");
                let record = Arc::new(Mutex::new(DeviceRecord::new(device_id.clone())));
                let guard = Arc::clone(&record).try_lock_owned();
                entry.insert(Arc::clone(&record));
                match guard {
                    Ok(guard) => Claim::Created(guard),
                    Err(_) => Claim::Existing(record),
                }
            }
        }
    }

    fn record(&self, device_id: &DeviceId) -> Option<SharedRecord> {
        self.devices
            .get(device_id)
            .map(|entry| Arc::clone(entry.value()))
    }
}

impl DeviceStore for InMemoryDeviceStore {
    fn ingest(
        &self,
        device_id: &DeviceId,
        readings: &[Reading],
    ) -> impl Future<Output = Result<(), TallyError>> + Send {
        // registration happens on first poll; a created record is filled
        // before the next await point
        async move {
            if readings.is_empty() {
                return Ok(());
            }
            let mut record = match self.claim(device_id) {
                Claim::Created(guard) => guard,
                Claim::Existing(record) => record.lock_owned().await,
            };
            let applied = record.record_batch(readings)?;
            tracing::trace!(device_id = %record.id(), applied, "readings recorded");
            Ok(())
        }
    }

    fn snapshot(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<DeviceSnapshot>, TallyError>> + Send {
        let record = self.record(device_id);
        async move {
            let Some(record) = record else {
                return Ok(None);
            };
            let snapshot = record.lock().await.snapshot();
            Ok(Some(snapshot))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tally_domain::error::ReadingError;
    use tally_domain::time::Timestamp;

    fn ts(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_704_067_200 + secs, 0).unwrap()
    }

    fn id(raw: &str) -> DeviceId {
        DeviceId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn should_return_none_for_unknown_device() {
        let store = InMemoryDeviceStore::new();
        assert!(store.snapshot(&id("ghost")).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn should_create_record_on_first_ingest() {
        let store = InMemoryDeviceStore::new();
        store
            .ingest(&id("d1"), &[Reading::new(ts(0), 5)])
            .await
            .unwrap();

        let snap = store.snapshot(&id("d1")).await.unwrap().unwrap();
        assert_eq!(snap.cumulative, 5);
        assert_eq!(snap.latest, ts(0));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn should_not_create_record_for_empty_batch() {
        let store = InMemoryDeviceStore::new();
        store.ingest(&id("d1"), &[]).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn should_not_register_device_when_ingest_is_dropped_unpolled() {
        let store = InMemoryDeviceStore::new();
        let device = id("fresh");
        let batch = [Reading::new(ts(0), 5)];
        let pending = store.ingest(&device, &batch);
        drop(pending);

        assert!(store.snapshot(&id("fresh")).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_never_observe_new_device_before_its_first_batch() {
        for round in 0..200 {
            let store = Arc::new(InMemoryDeviceStore::new());
            let device = id(&format!("fresh-{round}"));

            let reader = {
                let store = Arc::clone(&store);
                let device = device.clone();
                tokio::spawn(async move {
                    loop {
                        if let Some(snap) = store.snapshot(&device).await.unwrap() {
                            return snap;
                        }
                        tokio::task::yield_now().await;
                    }
                })
            };
            store
                .ingest(&device, &[Reading::new(ts(0), 3), Reading::new(ts(1), 4)])
                .await
                .unwrap();

            let snap = reader.await.unwrap();
            assert_eq!(snap.readings, 2);
            assert_eq!(snap.cumulative, 7);
        }
    }

    #[tokio::test]
    async fn should_keep_readings_applied_before_duplicate() {
        let store = InMemoryDeviceStore::new();
        store
            .ingest(&id("d1"), &[Reading::new(ts(0), 5)])
            .await
            .unwrap();

        let err = store
            .ingest(
                &id("d1"),
                &[
                    Reading::new(ts(1), 2),
                    Reading::new(ts(0), 7),
                    Reading::new(ts(2), 9),
                ],
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TallyError::Rejected(ReadingError::Duplicate { applied: 1, .. })
        ));
        let snap = store.snapshot(&id("d1")).await.unwrap().unwrap();
        assert_eq!(snap.cumulative, 7);
        assert_eq!(snap.latest, ts(1));
        assert_eq!(snap.readings, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_converge_concurrent_first_ingests_on_one_record() {
        const N: i64 = 64;
        let store = Arc::new(InMemoryDeviceStore::new());

        let handles: Vec<_> = (0..N)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .ingest(&id("fresh"), &[Reading::new(ts(i), i + 1)])
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.len(), 1);
        let snap = store.snapshot(&id("fresh")).await.unwrap().unwrap();
        assert_eq!(snap.readings, usize::try_from(N).unwrap());
        assert_eq!(snap.cumulative, N * (N + 1) / 2);
        assert_eq!(snap.latest, ts(N - 1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_accept_exactly_one_of_racing_identical_readings() {
        const N: usize = 32;
        let store = Arc::new(InMemoryDeviceStore::new());

        let handles: Vec<_> = (0..N)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .ingest(&id("d1"), &[Reading::new(ts(0), 1)])
                        .await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => accepted += 1,
                Err(err) => assert!(matches!(
                    err,
                    TallyError::Rejected(ReadingError::Duplicate { .. })
                )),
            }
        }

        assert_eq!(accepted, 1);
        let snap = store.snapshot(&id("d1")).await.unwrap().unwrap();
        assert_eq!(snap.cumulative, 1);
        assert_eq!(snap.readings, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_apply_non_overlapping_batches_without_lost_updates() {
        let store = Arc::new(InMemoryDeviceStore::new());

        let evens: Vec<Reading> = (0..100).map(|i| Reading::new(ts(i * 2), 1)).collect();
        let odds: Vec<Reading> = (0..100).map(|i| Reading::new(ts(i * 2 + 1), 2)).collect();

        let a = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.ingest(&id("d1"), &evens).await })
        };
        let b = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.ingest(&id("d1"), &odds).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let snap = store.snapshot(&id("d1")).await.unwrap().unwrap();
        assert_eq!(snap.readings, 200);
        assert_eq!(snap.cumulative, 300);
        assert_eq!(snap.latest, ts(199));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_only_observe_whole_batches_while_ingesting() {
        let store = Arc::new(InMemoryDeviceStore::new());
        store
            .ingest(&id("d1"), &[Reading::new(ts(-1), 0)])
            .await
            .unwrap();

        // each batch adds 10 readings of count 1, so a reader must always see
        // a cumulative that is a multiple of 10 matching the reading count
        let writer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for batch in 0..50 {
                    let readings: Vec<Reading> = (0..10)
                        .map(|i| Reading::new(ts(batch * 10 + i), 1))
                        .collect();
                    store.ingest(&id("d1"), &readings).await.unwrap();
                }
            })
        };
        let reader = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for _ in 0..200 {
                    let snap = store.snapshot(&id("d1")).await.unwrap().unwrap();
                    assert_eq!(snap.cumulative % 10, 0);
                    assert_eq!(usize::try_from(snap.cumulative).unwrap() + 1, snap.readings);
                    tokio::task::yield_now().await;
                }
            })
        };
        writer.await.unwrap();
        reader.await.unwrap();

        let snap = store.snapshot(&id("d1")).await.unwrap().unwrap();
        assert_eq!(snap.cumulative, 500);
    }

    #[tokio::test]
    async fn should_keep_devices_independent() {
        let store = InMemoryDeviceStore::new();
        store
            .ingest(&id("a"), &[Reading::new(ts(0), 1)])
            .await
            .unwrap();
        store
            .ingest(&id("b"), &[Reading::new(ts(0), 2)])
            .await
            .unwrap();

        assert_eq!(store.len(), 2);
        let a = store.snapshot(&id("a")).await.unwrap().unwrap();
        let b = store.snapshot(&id("b")).await.unwrap().unwrap();
        assert_eq!(a.cumulative, 1);
        assert_eq!(b.cumulative, 2);
    }
}
