//! Raw score -> [0, 1] risk, and risk -> level.

use serde::{Deserialize, Serialize};

use crate::types::RiskLevel;

pub const LOW_BELOW: f64 = 0.33;
pub const HIGH_FROM: f64 = 0.66;

const LOGISTIC_RANGE: f64 = 10.0;

/// Affine rescale bounds for raw scores outside both [0, 1] and the logistic
/// range. Empirical: fitted to the regressor's observed output span, needs
/// recalibration whenever the model changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub lo: f64,
    pub hi: f64,
}

impl Calibration {
    pub const REGRESSOR_SPAN: Calibration = Calibration { lo: 0.25, hi: 1.35 };
}

impl Default for Calibration {
    fn default() -> Self {
        Self::REGRESSOR_SPAN
    }
}

/// Map any raw score onto [0, 1]. Never fails; an undefined (NaN) score
/// maps to 1, the highest risk.
pub fn normalize(raw: f64, cal: &Calibration) -> f64 {
    if raw.is_nan() {
        return 1.0;
    }
    if (0.0..=1.0).contains(&raw) {
        return raw;
    }
    if (-LOGISTIC_RANGE..=LOGISTIC_RANGE).contains(&raw) {
        return 1.0 / (1.0 + (-raw).exp());
    }
    let span = cal.hi - cal.lo;
    let norm = if span > 0.0 {
        (raw - cal.lo) / span
    } else if raw > cal.hi {
        1.0
    } else {
        0.0
    };
    if norm.is_nan() {
        return 1.0;
    }
    norm.clamp(0.0, 1.0)
}

pub fn classify(score: f64) -> RiskLevel {
    if score < LOW_BELOW {
        RiskLevel::Low
    } else if score < HIGH_FROM {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}
