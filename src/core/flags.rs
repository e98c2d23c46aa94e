//! Proactive flag rules over biometric history.
//!
//! Each rule is a pure predicate over a most-recent-first slice of records
//! plus whatever baseline it needs. A rule returns `Ok(Some(flag))` when its
//! threshold condition holds, `Ok(None)` when it does not or when history is
//! too sparse to judge, and `Err` only for an internal fault (malformed
//! numerics). Faults are the engine's responsibility to contain; rules never
//! panic past their boundary.

use crate::config::FlagThresholds;
use crate::core::{round1, round2};
use crate::store::types::{CycleRecord, RecoveryRecord, SleepRecord};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Stable identifier for each rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKey {
    HrvDrop,
    LowRecovery,
    SleepDebt,
    SkinTemp,
    StrainOverload,
}

impl FlagKey {
    /// The wire-stable string form of the key.
    pub fn as_str(self) -> &'static str {
        match self {
            FlagKey::HrvDrop => "hrv_drop",
            FlagKey::LowRecovery => "low_recovery",
            FlagKey::SleepDebt => "sleep_debt",
            FlagKey::SkinTemp => "skin_temp",
            FlagKey::StrainOverload => "strain_overload",
        }
    }
}

impl std::fmt::Display for FlagKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgent a flag is for the downstream alerting collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warn,
    Alert,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warn => write!(f, "warn"),
            Severity::Alert => write!(f, "alert"),
        }
    }
}

/// An evidence-bearing alert produced by a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    /// Stable rule identifier
    pub key: FlagKey,
    /// Urgency of the signal
    pub severity: Severity,
    /// Human-readable, numerically grounded summary
    pub message: String,
    /// The numeric inputs that produced the verdict, for auditing and tests
    pub evidence: BTreeMap<String, f64>,
}

/// Internal fault raised by a single rule.
#[derive(Debug)]
pub struct RuleError {
    rule: FlagKey,
    detail: String,
}

impl RuleError {
    fn non_finite(rule: FlagKey, what: &str) -> Self {
        Self {
            rule,
            detail: format!("non-finite {what}"),
        }
    }

    /// Which rule raised the fault.
    pub fn rule(&self) -> FlagKey {
        self.rule
    }
}

impl std::fmt::Display for RuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} check failed: {}", self.rule, self.detail)
    }
}

impl std::error::Error for RuleError {}

/// Outcome of a single rule evaluation.
pub type RuleResult = Result<Option<Flag>, RuleError>;

fn ensure_finite(rule: FlagKey, what: &str, values: &[f64]) -> Result<(), RuleError> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(RuleError::non_finite(rule, what));
    }
    Ok(())
}

/// HRV suppressed below baseline for several consecutive days.
///
/// Declines without a defined baseline. `recoveries` must already be limited
/// to the trailing `hrv_drop_consecutive_days + 2` day window, newest first;
/// the two extra days tolerate missing-data gaps while still requiring the
/// full consecutive run of qualifying samples.
pub fn check_hrv_drop(
    recoveries: &[RecoveryRecord],
    hrv_baseline: Option<f64>,
    thresholds: &FlagThresholds,
) -> RuleResult {
    let Some(baseline) = hrv_baseline else {
        return Ok(None);
    };
    ensure_finite(FlagKey::HrvDrop, "HRV baseline", &[baseline])?;

    let days = thresholds.hrv_drop_consecutive_days;
    let recent: Vec<f64> = recoveries
        .iter()
        .filter_map(|r| r.hrv_rmssd_milli)
        .take(days)
        .collect();
    if recent.len() < days {
        return Ok(None);
    }
    ensure_finite(FlagKey::HrvDrop, "HRV value", &recent)?;

    let threshold = baseline * (1.0 - thresholds.hrv_drop_pct);
    if recent.iter().all(|&v| v < threshold) {
        let avg = round1(recent.iter().mean());
        let drop_pct = round1((baseline - avg) / baseline * 100.0);
        let mut evidence = BTreeMap::new();
        evidence.insert("avg_hrv".to_string(), avg);
        evidence.insert("baseline".to_string(), baseline);
        evidence.insert("drop_pct".to_string(), drop_pct);
        return Ok(Some(Flag {
            key: FlagKey::HrvDrop,
            severity: Severity::Alert,
            message: format!(
                "HRV has been {drop_pct}% below your {baseline}ms baseline for {days} \
                 consecutive days (avg: {avg}ms). Your body is under strain, consider a rest day."
            ),
            evidence,
        }));
    }
    Ok(None)
}

/// Recovery score in the red zone for several consecutive days.
pub fn check_low_recovery(recoveries: &[RecoveryRecord], thresholds: &FlagThresholds) -> RuleResult {
    let days = thresholds.low_recovery_consecutive_days;
    let recent: Vec<i64> = recoveries
        .iter()
        .filter_map(|r| r.recovery_score)
        .take(days)
        .collect();
    if recent.len() < days {
        return Ok(None);
    }

    if recent.iter().all(|&s| s < thresholds.low_recovery_threshold) {
        // Evidence keeps the scores in most-recent-first order.
        let mut evidence = BTreeMap::new();
        for (i, &score) in recent.iter().enumerate() {
            evidence.insert(format!("score_{}", i + 1), score as f64);
        }
        let scores: Vec<String> = recent.iter().map(|s| s.to_string()).collect();
        return Ok(Some(Flag {
            key: FlagKey::LowRecovery,
            severity: Severity::Alert,
            message: format!(
                "Recovery has been in the red zone (<{}%) for {days} days in a row: [{}]. \
                 Prioritize sleep and reduce training load.",
                thresholds.low_recovery_threshold,
                scores.join(", ")
            ),
            evidence,
        }));
    }
    Ok(None)
}

/// Latest sleep debt above the allowed ceiling.
///
/// Unlike the consecutive-day rules this inspects only the single most recent
/// debt-bearing sleep in the window.
pub fn check_sleep_debt(sleeps: &[SleepRecord], thresholds: &FlagThresholds) -> RuleResult {
    let Some(latest_debt_milli) = sleeps.iter().find_map(|s| s.sleep_debt_milli) else {
        return Ok(None);
    };

    let debt_hours = latest_debt_milli as f64 / 3_600_000.0;
    if debt_hours > thresholds.sleep_debt_threshold_hours {
        let debt_hours = round1(debt_hours);
        let mut evidence = BTreeMap::new();
        evidence.insert("debt_hours".to_string(), debt_hours);
        return Ok(Some(Flag {
            key: FlagKey::SleepDebt,
            severity: Severity::Warn,
            message: format!(
                "Sleep debt is {debt_hours}h, above your {}h threshold. \
                 Aim for an earlier bedtime tonight.",
                thresholds.sleep_debt_threshold_hours
            ),
            evidence,
        }));
    }
    Ok(None)
}

/// Skin temperature spiking above its own recent mean.
///
/// The baseline is the mean of all in-window samples excluding the most
/// recent one, so a single hot night stands out against a stable history.
pub fn check_skin_temp_spike(
    recoveries: &[RecoveryRecord],
    thresholds: &FlagThresholds,
) -> RuleResult {
    let temps: Vec<f64> = recoveries
        .iter()
        .filter_map(|r| r.skin_temp_celsius)
        .collect();
    if temps.len() < thresholds.skin_temp_min_samples {
        return Ok(None);
    }
    ensure_finite(FlagKey::SkinTemp, "skin temperature", &temps)?;

    let latest = temps[0];
    let baseline = temps[1..].iter().mean();
    let delta = latest - baseline;
    if delta > thresholds.skin_temp_spike_celsius {
        let latest = round2(latest);
        let baseline = round2(baseline);
        let delta = round2(delta);
        let mut evidence = BTreeMap::new();
        evidence.insert("latest".to_string(), latest);
        evidence.insert("baseline".to_string(), baseline);
        evidence.insert("delta".to_string(), delta);
        return Ok(Some(Flag {
            key: FlagKey::SkinTemp,
            severity: Severity::Alert,
            message: format!(
                "Skin temp spiked +{delta}°C above your recent baseline \
                 ({latest}°C vs {baseline}°C avg). Possible early illness signal."
            ),
            evidence,
        }));
    }
    Ok(None)
}

/// High strain outpacing recovery for a full run of days.
///
/// Cycles and recoveries are paired by the upstream `cycle_id` join key, so a
/// gap on one side cannot silently shift the pairing. A high-strain cycle
/// with no scored recovery counts as recovered (not overloaded).
pub fn check_strain_overload(
    cycles: &[CycleRecord],
    recoveries: &[RecoveryRecord],
    thresholds: &FlagThresholds,
) -> RuleResult {
    let days = thresholds.strain_overload_days;

    let strained: Vec<(&CycleRecord, f64)> = cycles
        .iter()
        .filter_map(|c| c.strain_score.map(|s| (c, s)))
        .collect();
    let scored: Vec<&RecoveryRecord> = recoveries
        .iter()
        .filter(|r| r.recovery_score.is_some())
        .collect();
    if strained.len() < days || scored.len() < days {
        return Ok(None);
    }
    let strains: Vec<f64> = strained.iter().map(|(_, s)| *s).collect();
    ensure_finite(FlagKey::StrainOverload, "strain score", &strains)?;

    let mut paired_scores: Vec<f64> = Vec::new();
    let mut overloaded_days = 0usize;
    for (cycle, strain) in strained.iter().take(days) {
        let recovery = scored
            .iter()
            .find(|r| r.cycle_id == cycle.id)
            .and_then(|r| r.recovery_score);
        if let Some(score) = recovery {
            paired_scores.push(score as f64);
        }
        // Missing recovery defaults to fully recovered.
        let score = recovery.unwrap_or(100);
        if *strain >= thresholds.strain_high_threshold
            && score < thresholds.strain_recovery_threshold
        {
            overloaded_days += 1;
        }
    }

    if overloaded_days >= days {
        let avg_strain = round1(strained.iter().take(days).map(|(_, s)| *s).mean());
        let avg_recovery = round1(paired_scores.iter().mean());
        let mut evidence = BTreeMap::new();
        evidence.insert("avg_strain".to_string(), avg_strain);
        evidence.insert("avg_recovery".to_string(), avg_recovery);
        return Ok(Some(Flag {
            key: FlagKey::StrainOverload,
            severity: Severity::Alert,
            message: format!(
                "High strain (avg {avg_strain}) has outpaced recovery (avg {avg_recovery}%) \
                 for {days} consecutive days. You're accumulating fatigue."
            ),
            evidence,
        }));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn recovery(days_ago: i64, score: Option<i64>, hrv: Option<f64>) -> RecoveryRecord {
        RecoveryRecord {
            cycle_id: 1000 - days_ago,
            recorded_at: Utc::now() - Duration::days(days_ago),
            recovery_score: score,
            hrv_rmssd_milli: hrv,
            resting_heart_rate: None,
            spo2_percentage: None,
            skin_temp_celsius: None,
            score_state: None,
        }
    }

    fn recovery_with_temp(days_ago: i64, temp: f64) -> RecoveryRecord {
        RecoveryRecord {
            skin_temp_celsius: Some(temp),
            ..recovery(days_ago, None, None)
        }
    }

    fn sleep(days_ago: i64, debt_milli: Option<i64>) -> SleepRecord {
        let end = Utc::now() - Duration::days(days_ago);
        SleepRecord {
            id: Uuid::new_v4(),
            cycle_id: None,
            start: end - Duration::hours(8),
            end,
            total_in_bed_milli: None,
            light_sleep_milli: None,
            slow_wave_milli: None,
            rem_sleep_milli: None,
            awake_count: None,
            sleep_performance_pct: None,
            sleep_efficiency_pct: None,
            respiratory_rate: None,
            sleep_debt_milli: debt_milli,
        }
    }

    fn cycle(id: i64, days_ago: i64, strain: Option<f64>) -> CycleRecord {
        CycleRecord {
            id,
            start: Utc::now() - Duration::days(days_ago),
            end: None,
            strain_score: strain,
            kilojoules: None,
            avg_heart_rate: None,
            max_heart_rate: None,
        }
    }

    fn defaults() -> FlagThresholds {
        FlagThresholds::default()
    }

    #[test]
    fn test_hrv_drop_fires_when_all_days_below_threshold() {
        let rows = vec![
            recovery(0, None, Some(70.0)),
            recovery(1, None, Some(75.0)),
            recovery(2, None, Some(80.0)),
        ];

        let flag = check_hrv_drop(&rows, Some(100.0), &defaults())
            .unwrap()
            .expect("should fire");
        assert_eq!(flag.key, FlagKey::HrvDrop);
        assert_eq!(flag.severity, Severity::Alert);
        assert_eq!(flag.evidence["avg_hrv"], 75.0);
        assert_eq!(flag.evidence["baseline"], 100.0);
        assert_eq!(flag.evidence["drop_pct"], 25.0);
        assert!(flag.message.contains("25%"));
    }

    #[test]
    fn test_hrv_drop_declines_when_one_day_above_threshold() {
        // 90 is above the 85.0 threshold for baseline 100 / drop 15%
        let rows = vec![
            recovery(0, None, Some(70.0)),
            recovery(1, None, Some(90.0)),
            recovery(2, None, Some(80.0)),
        ];
        assert!(check_hrv_drop(&rows, Some(100.0), &defaults())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_hrv_drop_declines_without_baseline() {
        let rows = vec![
            recovery(0, None, Some(10.0)),
            recovery(1, None, Some(10.0)),
            recovery(2, None, Some(10.0)),
        ];
        assert!(check_hrv_drop(&rows, None, &defaults()).unwrap().is_none());
    }

    #[test]
    fn test_hrv_drop_tolerates_gaps_but_needs_full_run() {
        // Null HRV rows are skipped, qualifying samples still form the run
        let rows = vec![
            recovery(0, None, Some(70.0)),
            recovery(1, None, None),
            recovery(2, None, Some(75.0)),
            recovery(3, None, None),
            recovery(4, None, Some(80.0)),
        ];
        assert!(check_hrv_drop(&rows, Some(100.0), &defaults())
            .unwrap()
            .is_some());

        // Only two qualifying samples: insufficient history, no flag
        let rows = vec![recovery(0, None, Some(70.0)), recovery(1, None, Some(75.0))];
        assert!(check_hrv_drop(&rows, Some(100.0), &defaults())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_hrv_drop_faults_on_non_finite_baseline() {
        let rows = vec![recovery(0, None, Some(70.0))];
        let err = check_hrv_drop(&rows, Some(f64::NAN), &defaults()).unwrap_err();
        assert_eq!(err.rule(), FlagKey::HrvDrop);
    }

    #[test]
    fn test_low_recovery_fires_on_consecutive_red_days() {
        let rows = vec![
            recovery(0, Some(20), None),
            recovery(1, Some(25), None),
            recovery(2, Some(30), None),
        ];

        let flag = check_low_recovery(&rows, &defaults())
            .unwrap()
            .expect("should fire");
        assert_eq!(flag.key, FlagKey::LowRecovery);
        assert_eq!(flag.evidence["score_1"], 20.0);
        assert_eq!(flag.evidence["score_2"], 25.0);
        assert_eq!(flag.evidence["score_3"], 30.0);
        assert!(flag.message.contains("[20, 25, 30]"));
    }

    #[test]
    fn test_low_recovery_declines_when_one_day_recovers() {
        let rows = vec![
            recovery(0, Some(20), None),
            recovery(1, Some(40), None),
            recovery(2, Some(30), None),
        ];
        assert!(check_low_recovery(&rows, &defaults()).unwrap().is_none());
    }

    #[test]
    fn test_low_recovery_boundary_is_strict() {
        // 33 is not strictly below the threshold of 33
        let rows = vec![
            recovery(0, Some(33), None),
            recovery(1, Some(20), None),
            recovery(2, Some(20), None),
        ];
        assert!(check_low_recovery(&rows, &defaults()).unwrap().is_none());
    }

    #[test]
    fn test_sleep_debt_fires_on_latest_sample() {
        // 9,000,000 ms = 2.5 h
        let rows = vec![sleep(0, Some(9_000_000)), sleep(1, Some(0))];
        let flag = check_sleep_debt(&rows, &defaults())
            .unwrap()
            .expect("should fire");
        assert_eq!(flag.key, FlagKey::SleepDebt);
        assert_eq!(flag.severity, Severity::Warn);
        assert_eq!(flag.evidence["debt_hours"], 2.5);
    }

    #[test]
    fn test_sleep_debt_declines_below_threshold() {
        // 3,000,000 ms = 0.83 h
        let rows = vec![sleep(0, Some(3_000_000))];
        assert!(check_sleep_debt(&rows, &defaults()).unwrap().is_none());
    }

    #[test]
    fn test_sleep_debt_skips_null_debt_rows() {
        // The newest row has no debt value; the rule inspects the newest
        // row that carries one, not older history beyond it.
        let rows = vec![sleep(0, None), sleep(1, Some(9_000_000))];
        assert!(check_sleep_debt(&rows, &defaults()).unwrap().is_some());

        let rows = vec![sleep(0, None)];
        assert!(check_sleep_debt(&rows, &defaults()).unwrap().is_none());
    }

    #[test]
    fn test_skin_temp_fires_on_spike() {
        let rows = vec![
            recovery_with_temp(0, 34.0),
            recovery_with_temp(1, 33.2),
            recovery_with_temp(2, 33.3),
            recovery_with_temp(3, 33.1),
            recovery_with_temp(4, 33.2),
        ];
        let flag = check_skin_temp_spike(&rows, &defaults())
            .unwrap()
            .expect("should fire");
        assert_eq!(flag.key, FlagKey::SkinTemp);
        assert_eq!(flag.evidence["latest"], 34.0);
        assert_eq!(flag.evidence["baseline"], 33.2);
        assert_eq!(flag.evidence["delta"], 0.8);
    }

    #[test]
    fn test_skin_temp_needs_minimum_samples() {
        let rows = vec![
            recovery_with_temp(0, 36.0),
            recovery_with_temp(1, 33.0),
            recovery_with_temp(2, 33.0),
            recovery_with_temp(3, 33.0),
        ];
        assert!(check_skin_temp_spike(&rows, &defaults()).unwrap().is_none());
    }

    #[test]
    fn test_skin_temp_faults_on_malformed_value() {
        let rows = vec![
            recovery_with_temp(0, 34.0),
            recovery_with_temp(1, f64::NAN),
            recovery_with_temp(2, 33.3),
            recovery_with_temp(3, 33.1),
            recovery_with_temp(4, 33.2),
        ];
        let err = check_skin_temp_spike(&rows, &defaults()).unwrap_err();
        assert_eq!(err.rule(), FlagKey::SkinTemp);
    }

    fn overload_fixture(recovered_day: Option<usize>) -> (Vec<CycleRecord>, Vec<RecoveryRecord>) {
        let mut cycles = Vec::new();
        let mut recoveries = Vec::new();
        for day in 0..5 {
            let id = 100 + day as i64;
            cycles.push(cycle(id, day as i64, Some(16.0)));
            let score = if recovered_day == Some(day) { 80 } else { 40 };
            let mut r = recovery(day as i64, Some(score), None);
            r.cycle_id = id;
            recoveries.push(r);
        }
        (cycles, recoveries)
    }

    #[test]
    fn test_strain_overload_fires_when_every_day_overloaded() {
        let (cycles, recoveries) = overload_fixture(None);
        let flag = check_strain_overload(&cycles, &recoveries, &defaults())
            .unwrap()
            .expect("should fire");
        assert_eq!(flag.key, FlagKey::StrainOverload);
        assert_eq!(flag.evidence["avg_strain"], 16.0);
        assert_eq!(flag.evidence["avg_recovery"], 40.0);
    }

    #[test]
    fn test_strain_overload_declines_if_any_day_recovered() {
        let (cycles, recoveries) = overload_fixture(Some(2));
        assert!(check_strain_overload(&cycles, &recoveries, &defaults())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_strain_overload_pairs_by_cycle_id() {
        // The recovery list is shuffled relative to the cycle list; the
        // cycle_id join must still line each day up correctly.
        let (cycles, mut recoveries) = overload_fixture(None);
        recoveries.reverse();
        assert!(check_strain_overload(&cycles, &recoveries, &defaults())
            .unwrap()
            .is_some());

        // An unpaired high-strain cycle counts as recovered
        let (cycles, mut recoveries) = overload_fixture(None);
        recoveries[0].cycle_id = 999;
        recoveries.push(recovery(6, Some(10), None)); // keep the count precondition met
        assert!(check_strain_overload(&cycles, &recoveries, &defaults())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_strain_overload_needs_enough_history() {
        let (mut cycles, recoveries) = overload_fixture(None);
        cycles.truncate(3);
        assert!(check_strain_overload(&cycles, &recoveries, &defaults())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_flag_serializes_with_stable_keys() {
        let rows = vec![
            recovery(0, Some(20), None),
            recovery(1, Some(25), None),
            recovery(2, Some(30), None),
        ];
        let flag = check_low_recovery(&rows, &defaults()).unwrap().unwrap();
        let json = serde_json::to_string(&flag).unwrap();
        assert!(json.contains("\"key\":\"low_recovery\""));
        assert!(json.contains("\"severity\":\"alert\""));
    }
}
