//! Materialized biometric record types.
//!
//! Every record is a plain owned value, fully extracted from whatever backing
//! store produced it. Rule evaluation never touches a live cursor or lazy
//! proxy, so record values stay valid after the originating query scope
//! closes. All biometric numerics are nullable: the wearable frequently
//! uploads partially-scored rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A daily recovery sample (HRV, recovery score, resting heart rate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryRecord {
    /// Upstream cycle this recovery scores (join key for strain pairing)
    pub cycle_id: i64,
    /// When the recovery was scored upstream
    pub recorded_at: DateTime<Utc>,
    /// Composite readiness metric, 0-100
    pub recovery_score: Option<i64>,
    /// Heart-rate variability (RMSSD) in milliseconds
    pub hrv_rmssd_milli: Option<f64>,
    /// Resting heart rate in bpm
    pub resting_heart_rate: Option<i64>,
    /// Blood oxygen saturation percentage
    pub spo2_percentage: Option<f64>,
    /// Skin temperature in degrees Celsius
    pub skin_temp_celsius: Option<f64>,
    /// Upstream scoring state ("SCORED", "PENDING_SCORE", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_state: Option<String>,
}

/// A sleep session with stage durations and debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    /// Upstream-assigned sleep ID
    pub id: Uuid,
    /// Cycle this sleep belongs to, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_id: Option<i64>,
    /// Sleep start time
    pub start: DateTime<Utc>,
    /// Sleep end time (records are ordered by this)
    pub end: DateTime<Utc>,
    /// Total time in bed, milliseconds
    pub total_in_bed_milli: Option<i64>,
    /// Light sleep duration, milliseconds
    pub light_sleep_milli: Option<i64>,
    /// Slow-wave (deep) sleep duration, milliseconds
    pub slow_wave_milli: Option<i64>,
    /// REM sleep duration, milliseconds
    pub rem_sleep_milli: Option<i64>,
    /// Number of wake disturbances
    pub awake_count: Option<i64>,
    /// Sleep performance percentage
    pub sleep_performance_pct: Option<f64>,
    /// Sleep efficiency percentage
    pub sleep_efficiency_pct: Option<f64>,
    /// Respiratory rate, breaths per minute
    pub respiratory_rate: Option<f64>,
    /// Accumulated sleep debt, milliseconds
    pub sleep_debt_milli: Option<i64>,
}

/// A physiological day cycle carrying the day's strain load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    /// Upstream-assigned cycle ID
    pub id: i64,
    /// Cycle start time (records are ordered by this)
    pub start: DateTime<Utc>,
    /// Cycle end time; `None` while the cycle is still open
    pub end: Option<DateTime<Utc>>,
    /// Day strain score
    pub strain_score: Option<f64>,
    /// Energy expenditure in kilojoules
    pub kilojoules: Option<f64>,
    /// Average heart rate over the cycle, bpm
    pub avg_heart_rate: Option<i64>,
    /// Maximum heart rate over the cycle, bpm
    pub max_heart_rate: Option<i64>,
}

/// A single logged workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    /// Upstream-assigned workout ID
    pub id: Uuid,
    /// Sport or activity name
    pub sport_name: Option<String>,
    /// Workout start time (records are ordered by this)
    pub start: DateTime<Utc>,
    /// Workout strain score
    pub strain_score: Option<f64>,
}
