//! Synchronization: projecting source entities into index records and
//! applying those projections to the store.
//!
//! `projector` is pure — no I/O, "not found" is a return value. `executor`
//! owns the single store write per sync.

pub mod executor;
pub mod projector;

pub use executor::{SyncOutcome, apply_sync, sync_category, sync_product};
pub use projector::{project_category, project_product};
