//! Pulse Sentinel - rule-based anomaly flagging over wearable biometric history.
//!
//! This library ingests synced biometric records (heart-rate variability,
//! recovery score, sleep staging, workout strain), derives rolling baselines,
//! and evaluates five threshold-based flag rules with per-rule fault
//! containment. Sync, chat delivery, scheduling, and narration are external
//! collaborators; they call in through [`FlagEngine`], the baseline
//! functions, and the context builders.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Pulse Sentinel                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │ RecordStore │──▶│  Baselines  │──▶│  Flag Rules │        │
//! │  │ (snapshot)  │   │ (30d means) │   │  (5 checks) │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │         │                                    │               │
//! │         ▼                                    ▼               │
//! │  ┌─────────────┐                     ┌─────────────┐        │
//! │  │   Context   │                     │ FlagEngine  │        │
//! │  │   Builder   │                     │ (contained) │        │
//! │  └─────────────┘                     └─────────────┘        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use pulse_sentinel::{FlagEngine, MemoryStore};
//! use std::path::Path;
//!
//! let store = MemoryStore::from_json_file(Path::new("records.json"))
//!     .expect("snapshot should load");
//! let engine = FlagEngine::new(&store);
//!
//! let flags = engine.run_with_fresh_baseline().expect("store should answer");
//! for flag in &flags {
//!     println!("[{}] {}", flag.severity, flag.message);
//! }
//! ```

pub mod config;
pub mod core;
pub mod notify;
pub mod store;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, FlagThresholds};
pub use core::{
    rolling_baseline, BaselineField, Flag, FlagEngine, FlagKey, RuleError, Severity,
    DEFAULT_BASELINE_WINDOW_DAYS,
};
pub use notify::{alert_flags, CollectingNotifier, LogNotifier, Notifier};
pub use store::{
    CycleRecord, MemoryStore, RecordSnapshot, RecordStore, RecoveryRecord, SleepRecord, StoreError,
    WorkoutRecord,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
