//! Read-only access to historical biometric records.
//!
//! The analysis core consumes exactly one query shape: "records with
//! timestamp >= cutoff, ordered descending by timestamp, optionally limited".
//! Anything that can answer those queries (a SQL database, an API cache, an
//! in-memory vector) can back the engine.

pub mod memory;
pub mod types;

pub use memory::{MemoryStore, RecordSnapshot};
pub use types::{CycleRecord, RecoveryRecord, SleepRecord, WorkoutRecord};

use chrono::{DateTime, Utc};

/// Read-only query interface over synced biometric history.
///
/// Implementations return fully-materialized vectors ordered most recent
/// first. A failing backend surfaces a [`StoreError`]; the analysis core
/// propagates it to the caller without retrying.
pub trait RecordStore {
    /// Recovery records with `recorded_at >= cutoff`, newest first.
    fn recoveries_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<RecoveryRecord>, StoreError>;

    /// Sleep records with `end >= cutoff`, newest first.
    fn sleeps_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<SleepRecord>, StoreError>;

    /// Cycle records with `start >= cutoff`, newest first.
    fn cycles_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<CycleRecord>, StoreError>;

    /// Workout records with `start >= cutoff`, newest first.
    fn workouts_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<WorkoutRecord>, StoreError>;
}

/// Errors raised by a record store backend.
#[derive(Debug)]
pub enum StoreError {
    /// Backend could not be reached or answered with a transport error.
    Unavailable(String),
    /// Backend answered but the payload could not be decoded.
    Corrupt(String),
    /// Local I/O failure while reading a snapshot file.
    Io(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(e) => write!(f, "store unavailable: {e}"),
            StoreError::Corrupt(e) => write!(f, "store data corrupt: {e}"),
            StoreError::Io(e) => write!(f, "store IO error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}
