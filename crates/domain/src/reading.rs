//! Reading — one timestamped counter sample pushed by a device.

use serde::{Deserialize, Serialize};

use crate::time::{InstantKey, Timestamp};

/// A single `(timestamp, count)` telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: Timestamp,
    pub count: i64,
}

impl Reading {
    #[must_use]
    pub fn new(timestamp: Timestamp, count: i64) -> Self {
        Self { timestamp, count }
    }

    /// Key under which this reading is deduplicated.
    #[must_use]
    pub fn key(&self) -> InstantKey {
        InstantKey::from(self.timestamp)
    }
}
