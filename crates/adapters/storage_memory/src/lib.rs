//! # tally-adapter-storage-memory
//!
//! In-memory implementation of the [`DeviceStore`](tally_app::ports::DeviceStore) port.
//!
//! ## Responsibilities
//! - Own every device record for the lifetime of the process
//! - Create records lazily, exactly once per device id, under concurrency
//! - Serialize batches for the same device while leaving other devices free
//!
//! ## Dependency rule
//! Depends on `tally-app` (for the port trait) and `tally-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod device_store;

pub use device_store::InMemoryDeviceStore;
