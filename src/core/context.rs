//! Textual data contexts for narration collaborators.
//!
//! The chat-bot and report collaborators feed these windows of data to a
//! language model; the engine itself only guarantees the numbers are the same
//! ones the flag rules saw. Missing sections render as explicit "No data"
//! lines rather than disappearing.

use crate::core::baseline::{rolling_baseline, BaselineField, DEFAULT_BASELINE_WINDOW_DAYS};
use crate::core::{round1, round2};
use crate::store::{RecordStore, StoreError};
use chrono::{Duration, NaiveDate, Utc};

/// Convert milliseconds to hours, two decimals.
fn milli_to_hours(ms: Option<i64>) -> Option<f64> {
    ms.map(|ms| round2(ms as f64 / 3_600_000.0))
}

/// Percentage of `part` over `total`, one decimal.
fn pct(part: Option<i64>, total: Option<i64>) -> Option<f64> {
    match (part, total) {
        (Some(part), Some(total)) if total > 0 => Some(round1(part as f64 / total as f64 * 100.0)),
        _ => None,
    }
}

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "unknown".to_string(),
    }
}

/// Build the daily context for `target_date`.
///
/// Covers the most recent recovery and sleep in a two-day window around the
/// date, the 7-day HRV/recovery trend, and the 30-day baselines.
pub fn build_daily_context(
    store: &dyn RecordStore,
    target_date: NaiveDate,
) -> Result<String, StoreError> {
    let midnight = target_date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc();
    let window_start = midnight - Duration::days(1);
    let window_end = window_start + Duration::days(2);
    let seven_day_cutoff = window_start - Duration::days(7);

    let recovery = store
        .recoveries_since(window_start, None)?
        .into_iter()
        .find(|r| r.recorded_at < window_end);
    let sleep = store
        .sleeps_since(window_start, None)?
        .into_iter()
        .find(|s| s.end < window_end);
    let recent_recoveries = store.recoveries_since(seven_day_cutoff, None)?;

    let now = Utc::now();
    let hrv_baseline = rolling_baseline(store, now, DEFAULT_BASELINE_WINDOW_DAYS, BaselineField::Hrv)?;
    let rhr_baseline = rolling_baseline(
        store,
        now,
        DEFAULT_BASELINE_WINDOW_DAYS,
        BaselineField::RestingHeartRate,
    )?;

    let mut lines = vec![format!("=== Daily Data Context: {target_date} ===\n")];

    match recovery {
        Some(r) => {
            let mut hrv_vs_baseline = String::new();
            if let (Some(hrv), Some(baseline)) = (r.hrv_rmssd_milli, hrv_baseline) {
                let delta_pct = round1((hrv - baseline) / baseline * 100.0);
                let direction = if delta_pct >= 0.0 { "up" } else { "down" };
                hrv_vs_baseline =
                    format!(" ({direction} {}% vs {baseline}ms baseline)", delta_pct.abs());
            }
            lines.push(format!(
                "RECOVERY: {}% | State: {}",
                fmt_opt(r.recovery_score),
                fmt_opt(r.score_state.clone())
            ));
            lines.push(format!(
                "HRV: {}ms{hrv_vs_baseline}",
                fmt_opt(r.hrv_rmssd_milli)
            ));
            lines.push(format!(
                "RHR: {}bpm (baseline: {}bpm)",
                fmt_opt(r.resting_heart_rate),
                fmt_opt(rhr_baseline)
            ));
            lines.push(format!(
                "SpO2: {}% | Skin temp: {}°C",
                fmt_opt(r.spo2_percentage),
                fmt_opt(r.skin_temp_celsius)
            ));
        }
        None => lines.push("RECOVERY: No data for this period".to_string()),
    }

    lines.push(String::new());

    match sleep {
        Some(s) => {
            lines.push(format!(
                "SLEEP: {}h in bed | Performance: {}% | Efficiency: {}%",
                fmt_opt(milli_to_hours(s.total_in_bed_milli)),
                fmt_opt(s.sleep_performance_pct),
                fmt_opt(s.sleep_efficiency_pct)
            ));
            lines.push(format!(
                "Stages: {}% deep / {}% REM / {}% light",
                fmt_opt(pct(s.slow_wave_milli, s.total_in_bed_milli)),
                fmt_opt(pct(s.rem_sleep_milli, s.total_in_bed_milli)),
                fmt_opt(pct(s.light_sleep_milli, s.total_in_bed_milli))
            ));
            lines.push(format!(
                "Disturbances: {} | Resp rate: {} rpm",
                fmt_opt(s.awake_count),
                fmt_opt(s.respiratory_rate)
            ));
            match milli_to_hours(s.sleep_debt_milli) {
                Some(debt) => lines.push(format!("Sleep debt: {debt}h")),
                None => lines.push("Sleep debt: unknown".to_string()),
            }
        }
        None => lines.push("SLEEP: No data for this period".to_string()),
    }

    if !recent_recoveries.is_empty() {
        let hrv_trend: Vec<f64> = recent_recoveries
            .iter()
            .filter_map(|r| r.hrv_rmssd_milli)
            .collect();
        let rec_trend: Vec<i64> = recent_recoveries
            .iter()
            .filter_map(|r| r.recovery_score)
            .collect();
        lines.push(String::new());
        lines.push(format!(
            "7-DAY TREND: HRV {hrv_trend:?} | Recovery scores {rec_trend:?}"
        ));
    }

    Ok(lines.join("\n"))
}

/// Build the weekly context covering the trailing `weeks_back` weeks.
pub fn build_weekly_context(
    store: &dyn RecordStore,
    weeks_back: i64,
) -> Result<String, StoreError> {
    let end = Utc::now();
    let start = end - Duration::weeks(weeks_back);
    let four_weeks_ago = end - Duration::weeks(4);

    // Stores answer newest-first; weekly narration reads oldest-first.
    let mut recoveries = store.recoveries_since(start, None)?;
    recoveries.reverse();
    let mut sleeps = store.sleeps_since(start, None)?;
    sleeps.reverse();
    let mut workouts = store.workouts_since(start, None)?;
    workouts.reverse();

    let prev_hrvs: Vec<f64> = store
        .recoveries_since(four_weeks_ago, None)?
        .iter()
        .filter(|r| r.recorded_at < start)
        .filter_map(|r| r.hrv_rmssd_milli)
        .collect();

    let mut lines = vec![format!(
        "=== Weekly Data Context: {} to {} ===\n",
        start.date_naive(),
        end.date_naive()
    )];

    if !recoveries.is_empty() {
        let hrv_vals: Vec<f64> = recoveries.iter().filter_map(|r| r.hrv_rmssd_milli).collect();
        let rec_scores: Vec<i64> = recoveries.iter().filter_map(|r| r.recovery_score).collect();
        lines.push(format!("RECOVERY SCORES: {rec_scores:?}"));
        lines.push(format!("HRV VALUES (ms): {hrv_vals:?}"));
        if !hrv_vals.is_empty() {
            let avg = round1(hrv_vals.iter().sum::<f64>() / hrv_vals.len() as f64);
            lines.push(format!("HRV avg this week: {avg}ms"));
        }
        if !prev_hrvs.is_empty() {
            let avg = round1(prev_hrvs.iter().sum::<f64>() / prev_hrvs.len() as f64);
            lines.push(format!("HRV avg prev 4 weeks: {avg}ms"));
        }
    }

    lines.push(String::new());

    if !sleeps.is_empty() {
        let total_hours: Vec<f64> = sleeps
            .iter()
            .filter_map(|s| milli_to_hours(s.total_in_bed_milli))
            .collect();
        let debt = sleeps
            .last()
            .and_then(|s| milli_to_hours(s.sleep_debt_milli));
        lines.push(format!("SLEEP (hours each night): {total_hours:?}"));
        lines.push(format!("Sleep debt end of week: {}h", fmt_opt(debt)));
    }

    if !workouts.is_empty() {
        let sports: Vec<String> = workouts
            .iter()
            .map(|w| fmt_opt(w.sport_name.clone()))
            .collect();
        let strains: Vec<f64> = workouts.iter().filter_map(|w| w.strain_score).collect();
        lines.push(String::new());
        lines.push(format!("WORKOUTS: {sports:?}"));
        lines.push(format!("Strain scores: {strains:?}"));
    }

    Ok(lines.join("\n"))
}
