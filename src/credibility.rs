//! Credibility engine
//!
//! Turns one exercise's outlier-screened history into a single trusted 1RM
//! estimate. Two estimators compete:
//!
//! - a recency-weighted mean (conservative, tracks recent form), and
//! - a robust peak, the 90th percentile of clean values (closer to true
//!   capability).
//!
//! A composite confidence score decides the blend: confident records lean on
//! the peak, shaky ones shrink toward the weighted mean.

use crate::aggregator::ExerciseHistory;
use crate::catalog::EquipmentClass;
use crate::config::EngineConfig;
use crate::outliers::detect_outliers;
use crate::stats::{mean, quantile_sorted, sample_std_dev, weighted_mean};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The four independent confidence factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityFactors {
    /// Equipment trust (0-1)
    pub equipment_trust: f64,
    /// `1 - e^(-n/5)` over all recorded sessions
    pub sample_size: f64,
    /// `e^(-days_since_last/45)`
    pub recency: f64,
    /// `1 / (1 + 4·CV)` over clean values
    pub consistency: f64,
}

impl CredibilityFactors {
    /// Product of all factors, clamped to 0-1
    pub fn composite(&self) -> f64 {
        (self.equipment_trust * self.sample_size * self.recency * self.consistency).clamp(0.0, 1.0)
    }
}

/// Credibility assessment of one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityRecord {
    /// One flag per history entry
    pub outlier_flags: Vec<bool>,
    pub outlier_count: usize,
    /// Entries that survived outlier screening
    pub clean_count: usize,
    pub weighted_mean: f64,
    pub robust_peak: f64,
    pub factors: CredibilityFactors,
    /// Composite confidence (0-1)
    pub confidence: f64,
    /// Confidence-weighted blend of robust peak and weighted mean
    pub credible_estimate: f64,
    /// Half-width of the 95%-style interval around the credible estimate
    pub interval_half_width: f64,
    /// Highest raw estimate, outliers included
    pub raw_best: f64,
    /// Date of the raw best
    pub pr_date: NaiveDate,
    pub equipment: EquipmentClass,
    pub days_since_last: i64,
    pub coefficient_of_variation: f64,
}

impl CredibilityRecord {
    /// Lower and upper interval bounds
    pub fn interval(&self) -> (f64, f64) {
        (
            self.credible_estimate - self.interval_half_width,
            self.credible_estimate + self.interval_half_width,
        )
    }
}

/// Recency weight of an observation `age_days` old, `0.5^(age/half_life)`
pub fn recency_weight(age_days: f64, half_life_days: f64) -> f64 {
    0.5_f64.powf(age_days.max(0.0) / half_life_days)
}

/// Assess an exercise history as of `today`.
///
/// Returns None only for an empty history.
pub fn assess(
    history: &ExerciseHistory,
    today: NaiveDate,
    config: &EngineConfig,
) -> Option<CredibilityRecord> {
    let entries = &history.entries;
    let last = entries.last()?;

    let estimates = history.estimates();
    let outliers = detect_outliers(&estimates, config);

    let (raw_best, pr_date) = entries
        .iter()
        .map(|e| (e.estimated_1rm, e.date))
        .fold((f64::MIN, last.date), |best, candidate| {
            if candidate.0 > best.0 {
                candidate
            } else {
                best
            }
        });

    let clean: Vec<(NaiveDate, f64)> = entries
        .iter()
        .zip(&outliers.flags)
        .filter(|(_, flagged)| !**flagged)
        .map(|(e, _)| (e.date, e.estimated_1rm))
        .collect();
    let clean_values: Vec<f64> = clean.iter().map(|(_, v)| *v).collect();

    // Ages count from the newest clean entry (or today, if earlier); the
    // relative weights are the same and never all underflow to zero.
    let reference = clean.iter().map(|(d, _)| *d).max().unwrap_or(last.date).min(today);
    let weights: Vec<f64> = clean
        .iter()
        .map(|(date, _)| {
            let age = (reference - *date).num_days() as f64;
            recency_weight(age, config.recency_half_life_days)
        })
        .collect();
    let weighted = weighted_mean(&clean_values, &weights).unwrap_or(raw_best);

    let mut sorted = clean_values.clone();
    sorted.sort_by(f64::total_cmp);
    let robust_peak = quantile_sorted(&sorted, config.robust_peak_quantile).unwrap_or(raw_best);

    let coefficient_of_variation = if clean_values.len() >= 3 {
        match (sample_std_dev(&clean_values), mean(&clean_values)) {
            (Some(sd), Some(m)) if m > 0.0 => sd / m,
            _ => 0.0,
        }
    } else {
        0.0
    };

    let days_since_last = (today - last.date).num_days().max(0);
    let equipment = history.tag.equipment;
    let factors = CredibilityFactors {
        equipment_trust: equipment.trust(),
        sample_size: 1.0 - (-(entries.len() as f64) / config.sample_size_scale).exp(),
        recency: (-(days_since_last as f64) / config.recency_decay_days).exp(),
        consistency: 1.0 / (1.0 + config.consistency_cv_weight * coefficient_of_variation),
    };
    let confidence = factors.composite();

    let credible_estimate = confidence * robust_peak + (1.0 - confidence) * weighted;

    let (std_dev, n) = match sample_std_dev(&clean_values) {
        Some(sd) => (sd, clean_values.len() as f64),
        None => (0.1 * robust_peak, 1.0),
    };
    let interval_half_width = (std_dev / n.sqrt()) / factors.equipment_trust * config.interval_z;

    Some(CredibilityRecord {
        outlier_count: outliers.outlier_count(),
        outlier_flags: outliers.flags,
        clean_count: clean_values.len(),
        weighted_mean: weighted,
        robust_peak,
        factors,
        confidence,
        credible_estimate,
        interval_half_width,
        raw_best,
        pr_date,
        equipment,
        days_since_last,
        coefficient_of_variation,
    })
}
