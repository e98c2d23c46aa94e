//! Rolling baselines for HRV and resting heart rate.
//!
//! A baseline is the arithmetic mean of all non-null values of a recovery
//! field over a trailing window, rounded to one decimal. With zero qualifying
//! records the baseline is undefined (`None`), never zero: downstream rules
//! must decline to fire rather than compare against a phantom threshold.

use crate::core::round1;
use crate::store::types::RecoveryRecord;
use crate::store::{RecordStore, StoreError};
use chrono::{DateTime, Duration, Utc};
use statrs::statistics::Statistics;

/// Default trailing window for baselines, in days.
pub const DEFAULT_BASELINE_WINDOW_DAYS: i64 = 30;

/// Which recovery field a baseline summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineField {
    /// Heart-rate variability (RMSSD, milliseconds)
    Hrv,
    /// Resting heart rate (bpm)
    RestingHeartRate,
}

impl BaselineField {
    fn extract(self, record: &RecoveryRecord) -> Option<f64> {
        match self {
            BaselineField::Hrv => record.hrv_rmssd_milli,
            BaselineField::RestingHeartRate => record.resting_heart_rate.map(|v| v as f64),
        }
    }
}

impl std::fmt::Display for BaselineField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaselineField::Hrv => write!(f, "hrv"),
            BaselineField::RestingHeartRate => write!(f, "rhr"),
        }
    }
}

/// Compute the rolling baseline for `field` over `[now - window_days, now)`.
///
/// Returns `Ok(None)` when no qualifying record exists. Store faults
/// propagate.
pub fn rolling_baseline(
    store: &dyn RecordStore,
    now: DateTime<Utc>,
    window_days: i64,
    field: BaselineField,
) -> Result<Option<f64>, StoreError> {
    let cutoff = now - Duration::days(window_days);
    let rows = store.recoveries_since(cutoff, None)?;

    let values: Vec<f64> = rows
        .iter()
        .filter(|r| r.recorded_at < now)
        .filter_map(|r| field.extract(r))
        .collect();

    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(round1(values.iter().mean())))
}
