//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp carried by readings and reported as a device's latest.
pub type Timestamp = DateTime<Utc>;

/// The Unix epoch, reported as `latest` for a device with no readings.
#[must_use]
pub fn epoch() -> Timestamp {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Exact-instant key used for duplicate detection.
///
/// Two timestamps map to the same key iff they denote the same instant,
/// whatever offset or precision they were written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstantKey {
    secs: i64,
    nanos: u32,
}

impl From<Timestamp> for InstantKey {
    fn from(ts: Timestamp) -> Self {
        Self {
            secs: ts.timestamp(),
            nanos: ts.timestamp_subsec_nanos(),
        }
    }
}
