//! Engine configuration
//!
//! Every tunable constant used by the statistical core lives here. The defaults
//! are the values the dashboard ships with.

use crate::error::AnalyticsError;
use crate::trend::TrendBasis;
use serde::{Deserialize, Serialize};

/// Consistency constant turning MAD into a standard-deviation estimate
/// under normality.
pub const MAD_SCALE: f64 = 1.4826;

/// Default bodyweight (kg) used when a snapshot carries no bodyweight at all.
pub const DEFAULT_BODYWEIGHT_KG: f64 = 80.0;

/// Tunable constants for the strength engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Points further than this many scaled MADs from the median are outliers
    pub outlier_mad_threshold: f64,
    /// Below this scaled MAD the data is too tight to call anything an outlier
    pub outlier_mad_floor: f64,
    /// Minimum history length before outlier detection runs
    pub outlier_min_points: usize,
    /// Half-life (days) of the recency weighting used for the weighted mean
    /// and the projection regression
    pub recency_half_life_days: f64,
    /// Percentile of clean values used as the robust peak (0-1)
    pub robust_peak_quantile: f64,
    /// Scale (sessions) of the sample-size factor `1 - e^(-n/scale)`
    pub sample_size_scale: f64,
    /// Decay constant (days) of the recency factor `e^(-days/decay)`
    pub recency_decay_days: f64,
    /// Weight of the coefficient of variation in `1 / (1 + w * CV)`
    pub consistency_cv_weight: f64,
    /// Two-sided z multiplier for the confidence interval
    pub interval_z: f64,
    /// Half-life (sessions) of the trend regression weights
    pub trend_half_life_sessions: f64,
    /// |t| above which a slope is called progressing/regressing
    pub trend_t_threshold: f64,
    /// Quantity the trend is fitted on
    pub trend_basis: TrendBasis,
    /// Projection horizon in days
    pub projection_horizon_days: f64,
    /// Minimum span (days) between first and last entry for a projection
    pub projection_min_span_days: i64,
    /// Bodyweight substituted when nothing can be resolved
    pub default_bodyweight_kg: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            outlier_mad_threshold: 2.5,
            outlier_mad_floor: 2.0,
            outlier_min_points: 4,
            recency_half_life_days: 30.0,
            robust_peak_quantile: 0.9,
            sample_size_scale: 5.0,
            recency_decay_days: 45.0,
            consistency_cv_weight: 4.0,
            interval_z: 1.96,
            trend_half_life_sessions: 4.0,
            trend_t_threshold: 1.5,
            trend_basis: TrendBasis::Absolute,
            projection_horizon_days: 30.0,
            projection_min_span_days: 7,
            default_bodyweight_kg: DEFAULT_BODYWEIGHT_KG,
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, AnalyticsError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, AnalyticsError> {
        serde_json::to_string_pretty(self).map_err(|e| AnalyticsError::EncodingError(e.to_string()))
    }

    /// Reject values that would make the statistics meaningless
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        let positive = [
            ("recency_half_life_days", self.recency_half_life_days),
            ("sample_size_scale", self.sample_size_scale),
            ("recency_decay_days", self.recency_decay_days),
            ("trend_half_life_sessions", self.trend_half_life_sessions),
            ("default_bodyweight_kg", self.default_bodyweight_kg),
            ("interval_z", self.interval_z),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AnalyticsError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        let non_negative = [
            ("outlier_mad_threshold", self.outlier_mad_threshold),
            ("outlier_mad_floor", self.outlier_mad_floor),
            ("consistency_cv_weight", self.consistency_cv_weight),
            ("trend_t_threshold", self.trend_t_threshold),
            ("projection_horizon_days", self.projection_horizon_days),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AnalyticsError::InvalidConfig(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.robust_peak_quantile) {
            return Err(AnalyticsError::InvalidConfig(format!(
                "robust_peak_quantile must be within 0-1, got {}",
                self.robust_peak_quantile
            )));
        }

        if self.projection_min_span_days < 0 {
            return Err(AnalyticsError::InvalidConfig(
                "projection_min_span_days must be non-negative".to_string(),
            ));
        }

        Ok(())
    }

    /// Decay rate (per session) of the trend weights, `ln 2 / half-life`
    pub fn trend_lambda(&self) -> f64 {
        std::f64::consts::LN_2 / self.trend_half_life_sessions
    }
}
