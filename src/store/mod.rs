//! Index record store.
//!
//! A sqlite-backed keyed store holding one denormalized document per
//! (entity type, entity id). Everything else in the crate reads or writes
//! through here.

pub mod migrations;
pub mod sqlite;

pub use sqlite::IndexStore;
