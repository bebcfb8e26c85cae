//! Shared test utilities.
//!
//! In-memory source stores and entity builders used by unit tests,
//! integration tests, and local experimentation. Kept in the library (not
//! `tests/`) so inline `#[cfg(test)]` modules can use them too.

pub mod fixtures;
