//! Core analysis: rolling baselines, flag rules, and the orchestrating engine.

pub mod baseline;
pub mod context;
pub mod engine;
pub mod flags;

pub use baseline::{rolling_baseline, BaselineField, DEFAULT_BASELINE_WINDOW_DAYS};
pub use engine::FlagEngine;
pub use flags::{Flag, FlagKey, RuleError, Severity};

/// Round to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
