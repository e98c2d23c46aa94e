//! In-memory record store.
//!
//! Backs the CLI (loading a JSON snapshot exported by the sync collaborator)
//! and the test suite. Queries sort on demand, so construction order does not
//! matter.

use crate::store::types::{CycleRecord, RecoveryRecord, SleepRecord, WorkoutRecord};
use crate::store::{RecordStore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serialized form of a full record history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSnapshot {
    #[serde(default)]
    pub recoveries: Vec<RecoveryRecord>,
    #[serde(default)]
    pub sleeps: Vec<SleepRecord>,
    #[serde(default)]
    pub cycles: Vec<CycleRecord>,
    #[serde(default)]
    pub workouts: Vec<WorkoutRecord>,
}

/// A [`RecordStore`] over owned vectors.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    recoveries: Vec<RecoveryRecord>,
    sleeps: Vec<SleepRecord>,
    cycles: Vec<CycleRecord>,
    workouts: Vec<WorkoutRecord>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot.
    pub fn from_snapshot(snapshot: RecordSnapshot) -> Self {
        Self {
            recoveries: snapshot.recoveries,
            sleeps: snapshot.sleeps,
            cycles: snapshot.cycles,
            workouts: snapshot.workouts,
        }
    }

    /// Load a store from a JSON snapshot file.
    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StoreError::Io(e.to_string()))?;
        let snapshot: RecordSnapshot =
            serde_json::from_str(&content).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Add a recovery record.
    pub fn push_recovery(&mut self, record: RecoveryRecord) {
        self.recoveries.push(record);
    }

    /// Add a sleep record.
    pub fn push_sleep(&mut self, record: SleepRecord) {
        self.sleeps.push(record);
    }

    /// Add a cycle record.
    pub fn push_cycle(&mut self, record: CycleRecord) {
        self.cycles.push(record);
    }

    /// Add a workout record.
    pub fn push_workout(&mut self, record: WorkoutRecord) {
        self.workouts.push(record);
    }

    /// Total number of records held.
    pub fn record_count(&self) -> usize {
        self.recoveries.len() + self.sleeps.len() + self.cycles.len() + self.workouts.len()
    }
}

/// Filter, sort descending by the extracted timestamp, and apply the limit.
fn query<T: Clone>(
    records: &[T],
    cutoff: DateTime<Utc>,
    limit: Option<usize>,
    timestamp: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut rows: Vec<T> = records
        .iter()
        .filter(|r| timestamp(r) >= cutoff)
        .cloned()
        .collect();
    rows.sort_by_key(|r| std::cmp::Reverse(timestamp(r)));
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    rows
}

impl RecordStore for MemoryStore {
    fn recoveries_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<RecoveryRecord>, StoreError> {
        Ok(query(&self.recoveries, cutoff, limit, |r| r.recorded_at))
    }

    fn sleeps_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<SleepRecord>, StoreError> {
        Ok(query(&self.sleeps, cutoff, limit, |s| s.end))
    }

    fn cycles_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<CycleRecord>, StoreError> {
        Ok(query(&self.cycles, cutoff, limit, |c| c.start))
    }

    fn workouts_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<WorkoutRecord>, StoreError> {
        Ok(query(&self.workouts, cutoff, limit, |w| w.start))
    }
}
