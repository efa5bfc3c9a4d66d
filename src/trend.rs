//! Trend estimation and projection
//!
//! Classifies each exercise's recent direction with a recency-weighted
//! regression over session order, and projects the credible estimate forward
//! when the dated series is rising.

use crate::aggregator::ExerciseHistory;
use crate::bodyweight::BodyweightSeries;
use crate::config::EngineConfig;
use crate::credibility::recency_weight;
use crate::standards::Tier;
use crate::stats::weighted_linear_fit;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Minimum number of sessions for a trend or projection
pub const MIN_TREND_POINTS: usize = 3;

/// Direction of an exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendClass {
    Progressing,
    Stalled,
    Regressing,
}

impl TrendClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendClass::Progressing => "progressing",
            TrendClass::Stalled => "stalled",
            TrendClass::Regressing => "regressing",
        }
    }
}

impl std::fmt::Display for TrendClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which quantity the trend is fitted on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendBasis {
    /// Estimated 1RM in kg
    #[default]
    Absolute,
    /// Estimated 1RM divided by the bodyweight on the session date
    RelativeToBodyweight,
}

/// Fitted line evaluated at the first and last session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendLine {
    pub start_index: usize,
    pub start_value: f64,
    pub end_index: usize,
    pub end_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    /// Change per session
    pub slope: f64,
    pub intercept: f64,
    /// None for an exact fit, where the slope sign decides
    pub t_statistic: Option<f64>,
    pub classification: TrendClass,
    pub line: TrendLine,
    pub points: usize,
}

fn classify_slope(t_statistic: Option<f64>, slope: f64, threshold: f64) -> TrendClass {
    match t_statistic {
        Some(t) if t > threshold => TrendClass::Progressing,
        Some(t) if t < -threshold => TrendClass::Regressing,
        Some(_) => TrendClass::Stalled,
        None if slope > 0.0 => TrendClass::Progressing,
        None if slope < 0.0 => TrendClass::Regressing,
        None => TrendClass::Stalled,
    }
}

/// Fit a trend over values in session order.
///
/// Session `i` of `n` is weighted `e^(λ·i)`, so the newest sessions count the
/// most. Returns None below three points.
pub fn estimate_trend(values: &[f64], config: &EngineConfig) -> Option<TrendResult> {
    if values.len() < MIN_TREND_POINTS {
        return None;
    }

    let lambda = config.trend_lambda();
    let xs: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
    let weights: Vec<f64> = xs.iter().map(|x| (lambda * x).exp()).collect();
    let fit = weighted_linear_fit(&xs, values, &weights)?;

    let end_index = values.len() - 1;
    Some(TrendResult {
        slope: fit.slope,
        intercept: fit.intercept,
        t_statistic: fit.t_statistic,
        classification: classify_slope(fit.t_statistic, fit.slope, config.trend_t_threshold),
        line: TrendLine {
            start_index: 0,
            start_value: fit.predict(0.0),
            end_index,
            end_value: fit.predict(end_index as f64),
        },
        points: values.len(),
    })
}

/// Per-session values to fit a trend on
pub fn trend_series(
    history: &ExerciseHistory,
    basis: TrendBasis,
    bodyweight: &BodyweightSeries,
    config: &EngineConfig,
) -> Vec<f64> {
    match basis {
        TrendBasis::Absolute => history.estimates(),
        TrendBasis::RelativeToBodyweight => history
            .entries
            .iter()
            .map(|e| e.estimated_1rm / bodyweight.resolve_or(e.date, config.default_bodyweight_kg))
            .collect(),
    }
}

/// Forward projection of a credible estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub current: f64,
    pub projected: f64,
    /// Fitted change per day
    pub daily_slope: f64,
    pub horizon_days: f64,
    /// Tier damping applied to the raw gain
    pub deceleration: f64,
    pub tier: Tier,
}

impl ProjectionResult {
    pub fn gain(&self) -> f64 {
        self.projected - self.current
    }
}

/// Dated values the projection regresses on.
///
/// Bodyweight-relative lifts use the added-weight equivalent so the projection
/// lives on the same scale as their standards comparison.
pub fn projection_series(
    history: &ExerciseHistory,
    bodyweight: &BodyweightSeries,
    config: &EngineConfig,
) -> Vec<(NaiveDate, f64)> {
    history
        .entries
        .iter()
        .map(|e| {
            let value = if history.tag.bodyweight_relative {
                e.estimated_1rm - bodyweight.resolve_or(e.date, config.default_bodyweight_kg)
            } else {
                e.estimated_1rm
            };
            (e.date, value)
        })
        .collect()
}

/// Project `current` forward by the configured horizon.
///
/// Needs at least three dated points spanning the minimum number of days. The
/// regression is on elapsed days, weighted by recency as of `today`. Only a
/// rising fit projects; the gain is damped by the tier's deceleration factor.
pub fn project(
    current: f64,
    tier: Tier,
    series: &[(NaiveDate, f64)],
    today: NaiveDate,
    config: &EngineConfig,
) -> Option<ProjectionResult> {
    if series.len() < MIN_TREND_POINTS {
        return None;
    }

    let first = series.iter().map(|(d, _)| *d).min()?;
    let last = series.iter().map(|(d, _)| *d).max()?;
    if (last - first).num_days() < config.projection_min_span_days {
        return None;
    }

    let xs: Vec<f64> = series.iter().map(|(d, _)| (*d - first).num_days() as f64).collect();
    let ys: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
    // Ages count from the newest point (or today, if earlier); the relative
    // weights are the same and never all underflow to zero.
    let reference = last.min(today);
    let weights: Vec<f64> = series
        .iter()
        .map(|(d, _)| {
            recency_weight((reference - *d).num_days() as f64, config.recency_half_life_days)
        })
        .collect();

    let fit = weighted_linear_fit(&xs, &ys, &weights)?;
    if fit.slope <= 0.0 {
        return None;
    }

    let deceleration = tier.deceleration();
    let horizon_days = config.projection_horizon_days;
    Some(ProjectionResult {
        current,
        projected: current + fit.slope * horizon_days * deceleration,
        daily_slope: fit.slope,
        horizon_days,
        deceleration,
        tier,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::HistoryEntry;
    use crate::catalog::classify_exercise;
    use chrono::Duration;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Duration::days(offset)
    }

    fn weekly_history(name: &str, values: &[f64]) -> ExerciseHistory {
        ExerciseHistory {
            name: name.to_string(),
            tag: classify_exercise(name),
            entries: values
                .iter()
                .enumerate()
                .map(|(i, v)| HistoryEntry {
                    date: day(i as i64 * 7),
                    effective_load: *v,
                    reps: 1,
                    estimated_1rm: *v,
                    rir: None,
                    is_assisted: false,
                })
                .collect(),
        }
    }

    /// `count` weekly points starting at 100 and moving `step` per week
    fn weekly_series(count: i64, step: f64) -> Vec<(NaiveDate, f64)> {
        (0..count).map(|i| (day(i * 7), 100.0 + step * i as f64)).collect()
    }

    #[test]
    fn test_rising_series_is_progressing() {
        let config = EngineConfig::default();
        let trend = estimate_trend(&[100.0, 101.5, 104.0, 105.0, 108.0], &config).unwrap();
        assert_eq!(trend.classification, TrendClass::Progressing);
        assert!(trend.slope > 0.0);
        assert!(trend.t_statistic.unwrap() > 1.5);
        assert_eq!(trend.points, 5);
        assert_eq!(trend.line.end_index, 4);
        assert!(trend.line.end_value > trend.line.start_value);
    }

    #[test]
    fn test_falling_series_is_regressing() {
        let config = EngineConfig::default();
        let trend = estimate_trend(&[108.0, 105.0, 104.0, 101.5, 100.0], &config).unwrap();
        assert_eq!(trend.classification, TrendClass::Regressing);
        assert!(trend.t_statistic.unwrap() < -1.5);
    }

    #[test]
    fn test_noisy_series_is_stalled() {
        let config = EngineConfig::default();
        let trend = estimate_trend(&[100.0, 104.0, 99.0, 103.0, 100.0, 102.0], &config).unwrap();
        assert_eq!(trend.classification, TrendClass::Stalled);

        let flat = estimate_trend(&[100.0, 100.0, 100.0, 100.0], &config).unwrap();
        assert_eq!(flat.classification, TrendClass::Stalled);
        assert_eq!(flat.t_statistic, Some(0.0));
    }

    #[test]
    fn test_exact_line_uses_slope_sign() {
        let trend = estimate_trend(&[100.0, 102.0, 104.0], &EngineConfig::default()).unwrap();
        assert_eq!(trend.classification, TrendClass::Progressing);
        assert!((trend.slope - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_points() {
        assert!(estimate_trend(&[100.0, 110.0], &EngineConfig::default()).is_none());
        assert!(estimate_trend(&[], &EngineConfig::default()).is_none());
    }

    #[test]
    fn test_classify_slope_thresholds() {
        assert_eq!(classify_slope(Some(1.6), 1.0, 1.5), TrendClass::Progressing);
        assert_eq!(classify_slope(Some(1.5), 1.0, 1.5), TrendClass::Stalled);
        assert_eq!(classify_slope(Some(-1.6), -1.0, 1.5), TrendClass::Regressing);
        assert_eq!(classify_slope(None, -0.5, 1.5), TrendClass::Regressing);
        assert_eq!(classify_slope(None, 0.0, 1.5), TrendClass::Stalled);
    }

    #[test]
    fn test_relative_basis_divides_by_bodyweight() {
        let history = weekly_history("Squat (Barbell)", &[100.0, 120.0, 140.0]);
        let mut bodyweight = BodyweightSeries::new();
        bodyweight.insert(day(0), 100.0);
        bodyweight.insert(day(7), 80.0);

        let config = EngineConfig::default();
        let relative =
            trend_series(&history, TrendBasis::RelativeToBodyweight, &bodyweight, &config);
        assert_eq!(relative, vec![1.0, 1.5, 1.75]);
        let absolute = trend_series(&history, TrendBasis::Absolute, &bodyweight, &config);
        assert_eq!(absolute, vec![100.0, 120.0, 140.0]);
    }

    #[test]
    fn test_projection_applies_deceleration() {
        let series = weekly_series(5, 1.0);
        let result =
            project(104.0, Tier::Intermediate, &series, day(28), &EngineConfig::default()).unwrap();

        assert!((result.daily_slope - 1.0 / 7.0).abs() < 1e-9);
        assert_eq!(result.deceleration, 0.55);
        let expected = 104.0 + (1.0 / 7.0) * 30.0 * 0.55;
        assert!((result.projected - expected).abs() < 1e-6);
        assert!(result.gain() > 0.0);
    }

    #[test]
    fn test_higher_tier_projects_less() {
        let series = weekly_series(5, 2.0);
        let config = EngineConfig::default();
        let novice = project(108.0, Tier::Novice, &series, day(28), &config).unwrap();
        let elite = project(108.0, Tier::Elite, &series, day(28), &config).unwrap();
        assert!(novice.projected > elite.projected);
    }

    #[test]
    fn test_stale_history_still_projects() {
        let series = weekly_series(5, 2.0);
        let config = EngineConfig::default();
        let recent = project(108.0, Tier::Novice, &series, day(28 + 365), &config).unwrap();
        for years in [5, 20, 100] {
            let stale = project(108.0, Tier::Novice, &series, day(28 + 365 * years), &config)
                .unwrap();
            assert!((stale.daily_slope - 2.0 / 7.0).abs() < 1e-9);
            assert!((stale.projected - recent.projected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_projection_preconditions() {
        let config = EngineConfig::default();
        let short_span: Vec<(NaiveDate, f64)> =
            (0..4).map(|i| (day(i * 2), 100.0 + i as f64)).collect();
        assert!(project(103.0, Tier::Novice, &short_span, day(6), &config).is_none());

        let two_points = vec![(day(0), 100.0), (day(14), 110.0)];
        assert!(project(110.0, Tier::Novice, &two_points, day(14), &config).is_none());

        let falling = weekly_series(4, -1.0);
        assert!(project(107.0, Tier::Novice, &falling, day(21), &config).is_none());
    }

    #[test]
    fn test_projection_series_for_bodyweight_lifts() {
        let history = weekly_history("Pull Up", &[90.0, 95.0, 100.0]);
        let mut bodyweight = BodyweightSeries::new();
        bodyweight.insert(day(0), 80.0);

        let series = projection_series(&history, &bodyweight, &EngineConfig::default());
        let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![10.0, 15.0, 20.0]);
    }
}
