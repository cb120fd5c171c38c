//! # tally-domain
//!
//! Pure domain model for the tally telemetry endpoint.
//!
//! ## Responsibilities
//! - Foundational types: device identifiers, error conventions, timestamps
//! - Define **Readings** (one timestamped counter sample)
//! - Define **Device records** (per-device aggregate: seen instants, sum, latest)
//! - Contain all invariant enforcement: duplicate detection, overflow checks,
//!   monotonic "latest" tracking
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! Concurrency and storage are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod reading;
