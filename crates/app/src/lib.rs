//! # tally-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DeviceStore` — concurrent per-device aggregate registry
//! - Define **driving/inbound ports** as use-case structs:
//!   - `TelemetryService` — ingest readings, query cumulative/latest/summary
//! - Validate requests before the store is touched
//!
//! ## Dependency rule
//! Depends on `tally-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
