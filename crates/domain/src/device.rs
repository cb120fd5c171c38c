//! Device record — the per-device aggregate built from accepted readings.
//!
//! A record enforces three invariants on every mutation:
//! - each instant is accepted at most once,
//! - `sum` equals the total of accepted counts,
//! - `latest` equals the greatest accepted timestamp.
//!
//! Records know nothing about locking. The storage adapter is responsible for
//! giving a batch exclusive access to a record.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::ReadingError;
use crate::id::DeviceId;
use crate::reading::Reading;
use crate::time::{InstantKey, Timestamp, epoch};

/// Aggregate state for one device.
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    id: DeviceId,
    seen: HashSet<InstantKey>,
    sum: i64,
    latest: Option<Timestamp>,
}

impl DeviceRecord {
    /// Create an empty record for `id`.
    #[must_use]
    pub fn new(id: DeviceId) -> Self {
        Self {
            id,
            seen: HashSet::new(),
            sum: 0,
            latest: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Sum of all accepted counts.
    #[must_use]
    pub fn sum(&self) -> i64 {
        self.sum
    }

    /// Greatest accepted timestamp, or the epoch when nothing was accepted.
    #[must_use]
    pub fn latest(&self) -> Timestamp {
        self.latest.unwrap_or_else(epoch)
    }

    /// Number of accepted readings.
    #[must_use]
    pub fn reading_count(&self) -> usize {
        self.seen.len()
    }

    /// Accept a single reading.
    ///
    /// # Errors
    ///
    /// Returns [`ReadingError::Duplicate`] if the instant was already
    /// accepted, or [`ReadingError::Overflow`] if the count does not fit in
    /// the running sum. The record is left untouched in both cases.
    pub fn record(&mut self, reading: &Reading) -> Result<(), ReadingError> {
        let key = reading.key();
        if self.seen.contains(&key) {
            return Err(ReadingError::Duplicate {
                timestamp: reading.timestamp,
                applied: 0,
            });
        }
        let sum = self
            .sum
            .checked_add(reading.count)
            .ok_or(ReadingError::Overflow {
                timestamp: reading.timestamp,
                applied: 0,
            })?;

        self.seen.insert(key);
        self.sum = sum;
        if self.latest.is_none_or(|latest| reading.timestamp > latest) {
            self.latest = Some(reading.timestamp);
        }
        Ok(())
    }

    /// Accept `readings` in order, stopping at the first rejected one.
    ///
    /// Readings accepted before the rejection stay applied. Returns the
    /// number of readings accepted.
    ///
    /// # Errors
    ///
    /// Returns the [`ReadingError`] of the first rejected reading, with
    /// `applied` set to how many readings of this batch were kept.
    pub fn record_batch(&mut self, readings: &[Reading]) -> Result<usize, ReadingError> {
        for (applied, reading) in readings.iter().enumerate() {
            self.record(reading).map_err(|err| err.with_applied(applied))?;
        }
        Ok(readings.len())
    }

    /// Copy the current aggregates.
    #[must_use]
    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            id: self.id.clone(),
            cumulative: self.sum,
            latest: self.latest(),
            readings: self.seen.len(),
        }
    }
}

/// Point-in-time copy of a [`DeviceRecord`]'s aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    pub cumulative: i64,
    pub latest: Timestamp,
    pub readings: usize,
}
