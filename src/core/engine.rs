//! The flag engine: fetches rule windows and runs the full rule set.
//!
//! Rules run in a fixed order with per-rule fault containment: an internal
//! rule fault is logged and treated as "no flag" so one malformed record can
//! never mask the remaining signals. Store faults are different; they
//! propagate to the caller, which owns its own retry policy.

use crate::config::Config;
use crate::core::baseline::{rolling_baseline, BaselineField};
use crate::core::flags::{self, Flag, RuleResult};
use crate::store::{RecordStore, StoreError};
use chrono::{DateTime, Duration, Utc};

/// Runs the full flag rule set against a record store.
pub struct FlagEngine<'a> {
    store: &'a dyn RecordStore,
    config: Config,
}

impl<'a> FlagEngine<'a> {
    /// Create an engine with default configuration.
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self::with_config(store, Config::default())
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(store: &'a dyn RecordStore, config: Config) -> Self {
        Self { store, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rolling HRV baseline over the configured window.
    pub fn hrv_baseline(&self) -> Result<Option<f64>, StoreError> {
        rolling_baseline(
            self.store,
            Utc::now(),
            self.config.baseline_window_days,
            BaselineField::Hrv,
        )
    }

    /// Rolling resting-heart-rate baseline over the configured window.
    pub fn rhr_baseline(&self) -> Result<Option<f64>, StoreError> {
        rolling_baseline(
            self.store,
            Utc::now(),
            self.config.baseline_window_days,
            BaselineField::RestingHeartRate,
        )
    }

    /// Compute a fresh HRV baseline and run all checks against it.
    pub fn run_with_fresh_baseline(&self) -> Result<Vec<Flag>, StoreError> {
        let hrv_baseline = self.hrv_baseline()?;
        self.run_all_checks(hrv_baseline)
    }

    /// Run the five rules in fixed order and return the flags that fired.
    ///
    /// `hrv_baseline` is the precomputed 30-day HRV baseline; `None` makes
    /// the HRV-drop rule decline. The returned order is the evaluation order
    /// and carries no priority meaning. Zero to five flags come back; sparse
    /// history is never an error.
    pub fn run_all_checks(&self, hrv_baseline: Option<f64>) -> Result<Vec<Flag>, StoreError> {
        let now = Utc::now();
        let thresholds = &self.config.thresholds;

        let hrv_window = self.recoveries_window(now, thresholds.hrv_drop_consecutive_days as i64 + 2)?;
        let recovery_window =
            self.recoveries_window(now, thresholds.low_recovery_consecutive_days as i64 + 2)?;
        let sleep_window = self
            .store
            .sleeps_since(now - Duration::days(thresholds.sleep_debt_window_days), None)?;
        let temp_window = self.recoveries_window(now, thresholds.skin_temp_window_days)?;
        let strain_days = thresholds.strain_overload_days as i64;
        let cycle_window = self
            .store
            .cycles_since(now - Duration::days(strain_days), None)?;
        let strain_recovery_window = self.recoveries_window(now, strain_days)?;

        let outcomes: [RuleResult; 5] = [
            flags::check_hrv_drop(&hrv_window, hrv_baseline, thresholds),
            flags::check_low_recovery(&recovery_window, thresholds),
            flags::check_sleep_debt(&sleep_window, thresholds),
            flags::check_skin_temp_spike(&temp_window, thresholds),
            flags::check_strain_overload(&cycle_window, &strain_recovery_window, thresholds),
        ];

        let mut fired = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(Some(flag)) => fired.push(flag),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(rule = %e.rule(), "flag check failed: {e}");
                }
            }
        }
        Ok(fired)
    }

    fn recoveries_window(
        &self,
        now: DateTime<Utc>,
        days: i64,
    ) -> Result<Vec<crate::store::types::RecoveryRecord>, StoreError> {
        self.store.recoveries_since(now - Duration::days(days), None)
    }
}
