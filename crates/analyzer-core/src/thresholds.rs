use serde::{Deserialize, Serialize};

use crate::error::{AnalyzerError, Result};
use crate::models::Metric;

// ── Defaults ──────────────────────────────────────────────────────────────────

pub const DEFAULT_PRESSURE_LIMIT: f64 = 7.0;
pub const DEFAULT_TEMPERATURE_LIMIT: f64 = 130.0;
pub const DEFAULT_RISK_SCORE_LIMIT: f64 = 140.0;

pub const DEFAULT_PRESSURE_WARNING: f64 = 6.5;
pub const DEFAULT_TEMPERATURE_WARNING: f64 = 115.0;
pub const DEFAULT_RISK_SCORE_WARNING: f64 = 120.0;

// ── RiskThresholds ────────────────────────────────────────────────────────────

/// Threshold configuration for the risk classifier.
///
/// A record is critical when any applicable critical limit is strictly
/// exceeded, and a warning when any applicable warning limit is. Flow is
/// never thresholded. Every limit must be finite and positive, and each
/// warning limit must not exceed its critical counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub pressure_limit: f64,
    pub temperature_limit: f64,
    pub risk_score_limit: f64,
    pub pressure_warning: f64,
    pub temperature_warning: f64,
    pub risk_score_warning: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            pressure_limit: DEFAULT_PRESSURE_LIMIT,
            temperature_limit: DEFAULT_TEMPERATURE_LIMIT,
            risk_score_limit: DEFAULT_RISK_SCORE_LIMIT,
            pressure_warning: DEFAULT_PRESSURE_WARNING,
            temperature_warning: DEFAULT_TEMPERATURE_WARNING,
            risk_score_warning: DEFAULT_RISK_SCORE_WARNING,
        }
    }
}

impl RiskThresholds {
    /// Build thresholds from optional critical-limit overrides, keeping the
    /// default warning limits but clamping each so it never exceeds its
    /// (possibly lowered) critical limit.
    pub fn with_limits(
        pressure: Option<f64>,
        temperature: Option<f64>,
        risk_score: Option<f64>,
    ) -> Result<Self> {
        let mut thresholds = Self::default();
        if let Some(value) = pressure {
            thresholds.pressure_limit = value;
        }
        if let Some(value) = temperature {
            thresholds.temperature_limit = value;
        }
        if let Some(value) = risk_score {
            thresholds.risk_score_limit = value;
        }
        thresholds.pressure_warning = thresholds.pressure_warning.min(thresholds.pressure_limit);
        thresholds.temperature_warning = thresholds
            .temperature_warning
            .min(thresholds.temperature_limit);
        thresholds.risk_score_warning = thresholds
            .risk_score_warning
            .min(thresholds.risk_score_limit);
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Check that every limit is a positive finite number and that warning
    /// limits do not exceed their critical counterparts.
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("pressure_limit", self.pressure_limit),
            ("temperature_limit", self.temperature_limit),
            ("risk_score_limit", self.risk_score_limit),
            ("pressure_warning", self.pressure_warning),
            ("temperature_warning", self.temperature_warning),
            ("risk_score_warning", self.risk_score_warning),
        ];
        for (name, value) in limits {
            if !value.is_finite() || value <= 0.0 {
                return Err(AnalyzerError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        let pairs = [
            ("pressure", self.pressure_warning, self.pressure_limit),
            (
                "temperature",
                self.temperature_warning,
                self.temperature_limit,
            ),
            ("risk_score", self.risk_score_warning, self.risk_score_limit),
        ];
        for (name, warning, limit) in pairs {
            if warning > limit {
                return Err(AnalyzerError::Config(format!(
                    "{} warning limit {} exceeds critical limit {}",
                    name, warning, limit
                )));
            }
        }
        Ok(())
    }

    /// Critical limit for `metric`, or `None` when the metric is not
    /// thresholded (flow).
    pub fn critical_limit(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Flow => None,
            Metric::Pressure => Some(self.pressure_limit),
            Metric::Temperature => Some(self.temperature_limit),
            Metric::RiskScore => Some(self.risk_score_limit),
        }
    }

    /// Warning limit for `metric`, or `None` when the metric is not
    /// thresholded (flow).
    pub fn warning_limit(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Flow => None,
            Metric::Pressure => Some(self.pressure_warning),
            Metric::Temperature => Some(self.temperature_warning),
            Metric::RiskScore => Some(self.risk_score_warning),
        }
    }
}
