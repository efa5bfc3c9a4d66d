//! Outlier detection
//!
//! Flags per-session estimates that sit too far from the rest of an exercise's
//! history. Uses the median and the median absolute deviation (MAD) so the test
//! is not dragged around by the very spikes it is looking for.

use crate::config::{EngineConfig, MAD_SCALE};
use crate::stats::median;
use serde::{Deserialize, Serialize};

/// Outlier flags with the statistics behind them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierSummary {
    /// Median of the input, when detection ran
    pub median: Option<f64>,
    /// MAD × 1.4826, when detection ran
    pub scaled_mad: Option<f64>,
    /// One flag per input value
    pub flags: Vec<bool>,
}

impl OutlierSummary {
    pub fn outlier_count(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }
}

/// Run MAD-based outlier detection.
///
/// Fewer than `outlier_min_points` values, or a scaled MAD below
/// `outlier_mad_floor`, flag nothing.
pub fn detect_outliers(values: &[f64], config: &EngineConfig) -> OutlierSummary {
    let none_flagged = vec![false; values.len()];

    if values.len() < config.outlier_min_points {
        return OutlierSummary {
            median: None,
            scaled_mad: None,
            flags: none_flagged,
        };
    }

    let Some(center) = median(values) else {
        return OutlierSummary {
            median: None,
            scaled_mad: None,
            flags: none_flagged,
        };
    };

    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    let scaled_mad = median(&deviations).unwrap_or(0.0) * MAD_SCALE;

    if scaled_mad < config.outlier_mad_floor {
        return OutlierSummary {
            median: Some(center),
            scaled_mad: Some(scaled_mad),
            flags: none_flagged,
        };
    }

    let limit = config.outlier_mad_threshold * scaled_mad;
    let flags = deviations.iter().map(|d| *d > limit).collect();

    OutlierSummary {
        median: Some(center),
        scaled_mad: Some(scaled_mad),
        flags,
    }
}

/// Parallel outlier flags for a sequence of estimates
pub fn flag_outliers(values: &[f64], config: &EngineConfig) -> Vec<bool> {
    detect_outliers(values, config).flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spike_is_flagged() {
        let values = [100.0, 102.0, 101.0, 104.0, 103.0, 150.0];
        let summary = detect_outliers(&values, &EngineConfig::default());

        assert_eq!(summary.flags, vec![false, false, false, false, false, true]);
        assert_eq!(summary.median, Some(102.5));
        // MAD of [2.5, 0.5, 1.5, 1.5, 0.5, 47.5] is 1.5
        assert!((summary.scaled_mad.unwrap() - 1.5 * MAD_SCALE).abs() < 1e-9);
        assert_eq!(summary.outlier_count(), 1);
    }

    #[test]
    fn test_short_histories_never_flag() {
        let config = EngineConfig::default();
        assert_eq!(flag_outliers(&[], &config), Vec::<bool>::new());
        assert_eq!(flag_outliers(&[100.0], &config), vec![false]);
        assert_eq!(flag_outliers(&[100.0, 500.0, 90.0], &config), vec![false; 3]);
    }

    #[test]
    fn test_tight_data_below_mad_floor() {
        // MAD is 0.25 -> scaled 0.37, under the 2.0 floor, so even 130 passes
        let values = [100.0, 100.5, 100.0, 99.5, 100.0, 130.0];
        let summary = detect_outliers(&values, &EngineConfig::default());
        assert!(summary.scaled_mad.unwrap() < 2.0);
        assert!(summary.flags.iter().all(|f| !f));
    }

    #[test]
    fn test_low_spike_is_flagged_too() {
        let values = [120.0, 118.0, 123.0, 121.0, 60.0, 119.0, 124.0];
        let flags = flag_outliers(&values, &EngineConfig::default());
        assert_eq!(flags.iter().filter(|f| **f).count(), 1);
        assert!(flags[4]);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let values = [100.0, 102.0, 101.0, 104.0, 103.0, 107.0];
        let strict = EngineConfig {
            outlier_mad_threshold: 1.0,
            ..EngineConfig::default()
        };
        assert!(flag_outliers(&values, &strict)[5]);
        assert!(!flag_outliers(&values, &EngineConfig::default())[5]);
    }
}
