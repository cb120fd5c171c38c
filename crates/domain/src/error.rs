//! Common error types used across the workspace.
//!
//! Each failure family has its own typed error; [`TallyError`] aggregates
//! them via `#[from]` so every layer can propagate with `?`.

use crate::time::Timestamp;

/// Top-level error returned by services and ports.
#[derive(Debug, thiserror::Error)]
pub enum TallyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Rejected(#[from] ReadingError),
}

/// Request-shape errors detected before the store is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("device id must be specified.")]
    EmptyDeviceId,
}

/// A lookup for an unknown key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A reading that stopped its batch.
///
/// `applied` is the number of readings from the same batch that were
/// accepted before this one. Those are kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadingError {
    /// The timestamp was already recorded for this device.
    #[error("duplicate reading.")]
    Duplicate { timestamp: Timestamp, applied: usize },

    /// Adding the count would overflow the device's cumulative sum.
    #[error("count overflow.")]
    Overflow { timestamp: Timestamp, applied: usize },
}

impl ReadingError {
    /// Number of readings from the rejected batch that were accepted.
    #[must_use]
    pub fn applied(&self) -> usize {
        match self {
            Self::Duplicate { applied, .. } | Self::Overflow { applied, .. } => *applied,
        }
    }

    /// Timestamp of the reading that was refused.
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Duplicate { timestamp, .. } | Self::Overflow { timestamp, .. } => *timestamp,
        }
    }

    pub(crate) fn with_applied(self, applied: usize) -> Self {
        match self {
            Self::Duplicate { timestamp, .. } => Self::Duplicate { timestamp, applied },
            Self::Overflow { timestamp, .. } => Self::Overflow { timestamp, applied },
        }
    }
}
