//! Strength standards
//!
//! A static table of population strength standards indexed by lift category and
//! bodyweight bracket, with linear interpolation between brackets, tier
//! classification and percentile estimation.

use crate::aggregator::ExerciseHistory;
use crate::bodyweight::BodyweightSeries;
use crate::catalog::LiftCategory;
use crate::config::EngineConfig;
use crate::credibility::CredibilityRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Bodyweight brackets (kg) of the standards table
pub const BODYWEIGHT_BRACKETS: [f64; 7] = [60.0, 70.0, 80.0, 90.0, 100.0, 110.0, 120.0];

/// Percentile anchors at each tier threshold
pub const TIER_PERCENTILES: [f64; 5] = [5.0, 20.0, 50.0, 80.0, 95.0];

/// Percentiles above elite approach this ceiling
pub const MAX_PERCENTILE: f64 = 99.0;

/// One row per bracket: beginner, novice, intermediate, advanced, elite (kg).
/// Pull-up and dip rows are load added on top of bodyweight.
type StandardsRows = [[f64; 5]; 7];

const BENCH_PRESS: StandardsRows = [
    [40.0, 55.0, 75.0, 100.0, 125.0],
    [47.0, 64.0, 86.0, 113.0, 141.0],
    [54.0, 72.0, 96.0, 125.0, 155.0],
    [60.0, 80.0, 105.0, 136.0, 168.0],
    [65.0, 87.0, 114.0, 146.0, 179.0],
    [70.0, 93.0, 121.0, 155.0, 189.0],
    [74.0, 98.0, 128.0, 163.0, 198.0],
];

const SQUAT: StandardsRows = [
    [52.0, 72.0, 98.0, 130.0, 165.0],
    [61.0, 84.0, 112.0, 147.0, 185.0],
    [70.0, 95.0, 125.0, 162.0, 203.0],
    [78.0, 105.0, 137.0, 176.0, 219.0],
    [85.0, 114.0, 148.0, 189.0, 234.0],
    [91.0, 122.0, 158.0, 200.0, 247.0],
    [97.0, 129.0, 167.0, 211.0, 259.0],
];

const DEADLIFT: StandardsRows = [
    [65.0, 88.0, 118.0, 155.0, 195.0],
    [76.0, 101.0, 134.0, 174.0, 217.0],
    [86.0, 114.0, 149.0, 192.0, 237.0],
    [95.0, 125.0, 162.0, 207.0, 255.0],
    [103.0, 135.0, 174.0, 221.0, 271.0],
    [110.0, 144.0, 185.0, 234.0, 285.0],
    [117.0, 152.0, 195.0, 245.0, 298.0],
];

const OVERHEAD_PRESS: StandardsRows = [
    [26.0, 36.0, 49.0, 65.0, 82.0],
    [30.0, 42.0, 56.0, 73.0, 92.0],
    [34.0, 47.0, 62.0, 81.0, 101.0],
    [38.0, 51.0, 68.0, 88.0, 109.0],
    [41.0, 55.0, 73.0, 94.0, 116.0],
    [44.0, 59.0, 78.0, 100.0, 123.0],
    [47.0, 63.0, 82.0, 105.0, 129.0],
];

const BARBELL_ROW: StandardsRows = [
    [37.0, 51.0, 69.0, 91.0, 115.0],
    [43.0, 59.0, 79.0, 103.0, 129.0],
    [49.0, 66.0, 87.0, 113.0, 141.0],
    [54.0, 72.0, 95.0, 123.0, 152.0],
    [58.0, 78.0, 102.0, 131.0, 162.0],
    [62.0, 83.0, 108.0, 138.0, 170.0],
    [66.0, 88.0, 114.0, 145.0, 178.0],
];

const PULL_UP: StandardsRows = [
    [2.0, 10.0, 22.0, 36.0, 52.0],
    [2.0, 10.0, 23.0, 38.0, 55.0],
    [3.0, 11.0, 24.0, 40.0, 58.0],
    [3.0, 12.0, 25.0, 42.0, 61.0],
    [3.0, 12.0, 26.0, 44.0, 63.0],
    [4.0, 13.0, 27.0, 45.0, 65.0],
    [4.0, 13.0, 28.0, 46.0, 67.0],
];

const DIP: StandardsRows = [
    [3.0, 14.0, 30.0, 48.0, 68.0],
    [4.0, 15.0, 32.0, 51.0, 72.0],
    [4.0, 16.0, 34.0, 54.0, 76.0],
    [5.0, 17.0, 36.0, 57.0, 80.0],
    [5.0, 18.0, 37.0, 59.0, 83.0],
    [6.0, 19.0, 38.0, 61.0, 86.0],
    [6.0, 19.0, 39.0, 63.0, 88.0],
];

fn rows_for(category: LiftCategory) -> &'static StandardsRows {
    match category {
        LiftCategory::BenchPress => &BENCH_PRESS,
        LiftCategory::Squat => &SQUAT,
        LiftCategory::Deadlift => &DEADLIFT,
        LiftCategory::OverheadPress => &OVERHEAD_PRESS,
        LiftCategory::BarbellRow => &BARBELL_ROW,
        LiftCategory::PullUp => &PULL_UP,
        LiftCategory::Dip => &DIP,
    }
}

/// Strength tier; `Below` sits under the beginner threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Below,
    Beginner,
    Novice,
    Intermediate,
    Advanced,
    Elite,
}

impl Tier {
    /// Tiers that have a threshold, in ascending order
    pub const RANKED: [Tier; 5] = [
        Tier::Beginner,
        Tier::Novice,
        Tier::Intermediate,
        Tier::Advanced,
        Tier::Elite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Below => "below",
            Tier::Beginner => "beginner",
            Tier::Novice => "novice",
            Tier::Intermediate => "intermediate",
            Tier::Advanced => "advanced",
            Tier::Elite => "elite",
        }
    }

    /// Damping applied to projected progress; gains slow as capability rises
    pub fn deceleration(&self) -> f64 {
        match self {
            Tier::Below => 1.0,
            Tier::Beginner => 0.85,
            Tier::Novice => 0.70,
            Tier::Intermediate => 0.55,
            Tier::Advanced => 0.40,
            Tier::Elite => 0.25,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Five ordered tier thresholds (kg)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub beginner: f64,
    pub novice: f64,
    pub intermediate: f64,
    pub advanced: f64,
    pub elite: f64,
}

impl TierThresholds {
    pub fn from_array(values: [f64; 5]) -> Self {
        Self {
            beginner: values[0],
            novice: values[1],
            intermediate: values[2],
            advanced: values[3],
            elite: values[4],
        }
    }

    pub fn as_array(&self) -> [f64; 5] {
        [self.beginner, self.novice, self.intermediate, self.advanced, self.elite]
    }
}

/// Thresholds for `category` at `bodyweight_kg`.
///
/// Bodyweight is clamped to the bracket range, then each tier is linearly
/// interpolated between the neighbouring brackets.
pub fn standards_for_bodyweight(category: LiftCategory, bodyweight_kg: f64) -> TierThresholds {
    let rows = rows_for(category);
    let first = BODYWEIGHT_BRACKETS[0];
    let last = BODYWEIGHT_BRACKETS[BODYWEIGHT_BRACKETS.len() - 1];
    let bw = if bodyweight_kg.is_finite() {
        bodyweight_kg.clamp(first, last)
    } else {
        first
    };

    let upper = BODYWEIGHT_BRACKETS
        .iter()
        .position(|b| *b >= bw)
        .unwrap_or(BODYWEIGHT_BRACKETS.len() - 1);
    if upper == 0 || BODYWEIGHT_BRACKETS[upper] == bw {
        return TierThresholds::from_array(rows[upper]);
    }
    let lower = upper - 1;

    let span = BODYWEIGHT_BRACKETS[upper] - BODYWEIGHT_BRACKETS[lower];
    let t = (bw - BODYWEIGHT_BRACKETS[lower]) / span;
    let mut values = [0.0; 5];
    for (i, value) in values.iter_mut().enumerate() {
        *value = rows[lower][i] + (rows[upper][i] - rows[lower][i]) * t;
    }
    TierThresholds::from_array(values)
}

/// Where a value sits among the tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiftClassification {
    pub tier: Tier,
    /// None once elite is reached
    pub next_tier: Option<Tier>,
    /// Whole kilograms still needed for the next tier (rounded up)
    pub delta_to_next: f64,
    /// Progress through the current band, 0-100
    pub progress_pct: f64,
}

/// Classify `value` against ordered tier thresholds
pub fn classify_lift(value: f64, thresholds: &TierThresholds) -> LiftClassification {
    let levels = thresholds.as_array();

    let Some(next_index) = levels.iter().position(|t| *t > value) else {
        return LiftClassification {
            tier: Tier::Elite,
            next_tier: None,
            delta_to_next: 0.0,
            progress_pct: 100.0,
        };
    };

    let next_threshold = levels[next_index];
    let (tier, floor) = if next_index == 0 {
        (Tier::Below, 0.0)
    } else {
        (Tier::RANKED[next_index - 1], levels[next_index - 1])
    };

    let band = next_threshold - floor;
    let progress_pct = if band > 0.0 {
        ((value - floor) / band * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    LiftClassification {
        tier,
        next_tier: Some(Tier::RANKED[next_index]),
        delta_to_next: (next_threshold - value).ceil(),
        progress_pct,
    }
}

/// Population percentile of `value` (0-99)
pub fn percentile(value: f64, thresholds: &TierThresholds) -> f64 {
    let levels = thresholds.as_array();

    if value < levels[0] {
        if levels[0] <= 0.0 {
            return 0.0;
        }
        return (TIER_PERCENTILES[0] * value / levels[0]).clamp(0.0, TIER_PERCENTILES[0]);
    }

    for i in 1..levels.len() {
        if value < levels[i] {
            let band = levels[i] - levels[i - 1];
            let t = if band > 0.0 { (value - levels[i - 1]) / band } else { 0.0 };
            return TIER_PERCENTILES[i - 1] + (TIER_PERCENTILES[i] - TIER_PERCENTILES[i - 1]) * t;
        }
    }

    let elite = levels[4];
    let scale = (elite * 0.1).max(1.0);
    let excess = (value - elite) / scale;
    let headroom = MAX_PERCENTILE - TIER_PERCENTILES[4];
    (TIER_PERCENTILES[4] + headroom * (1.0 - (-excess).exp())).min(MAX_PERCENTILE)
}

/// Full standards comparison for one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardsClassification {
    pub category: LiftCategory,
    /// Bodyweight used to pick the thresholds
    pub bodyweight_kg: f64,
    /// Value compared against the thresholds: the credible estimate, or the
    /// added-weight equivalent for bodyweight-relative lifts
    pub compared_value: f64,
    pub thresholds: TierThresholds,
    pub tier: Tier,
    pub next_tier: Option<Tier>,
    pub delta_to_next: f64,
    pub progress_pct: f64,
    pub percentile: f64,
}

/// Compare an exercise's credible estimate against the standards.
///
/// Returns None for exercises without a category and for equipment whose
/// loading is not comparable to free weights.
pub fn classify_against_standards(
    history: &ExerciseHistory,
    record: &CredibilityRecord,
    bodyweight: &BodyweightSeries,
    today: NaiveDate,
    config: &EngineConfig,
) -> Option<StandardsClassification> {
    let category = history.tag.category?;
    if !history.tag.equipment.comparable_to_standards() {
        return None;
    }

    let bodyweight_kg = bodyweight.resolve_or(today, config.default_bodyweight_kg);
    let compared_value = if category.is_bodyweight_relative() {
        let pr_bodyweight = bodyweight.resolve_or(record.pr_date, config.default_bodyweight_kg);
        record.credible_estimate - pr_bodyweight
    } else {
        record.credible_estimate
    };

    let thresholds = standards_for_bodyweight(category, bodyweight_kg);
    let classification = classify_lift(compared_value, &thresholds);

    Some(StandardsClassification {
        category,
        bodyweight_kg,
        compared_value,
        thresholds,
        tier: classification.tier,
        next_tier: classification.next_tier,
        delta_to_next: classification.delta_to_next,
        progress_pct: classification.progress_pct,
        percentile: percentile(compared_value, &thresholds),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn example_thresholds() -> TierThresholds {
        TierThresholds::from_array([60.0, 80.0, 100.0, 130.0, 160.0])
    }

    #[test]
    fn test_classify_lift_example() {
        let c = classify_lift(75.0, &example_thresholds());
        assert_eq!(c.tier, Tier::Beginner);
        assert_eq!(c.next_tier, Some(Tier::Novice));
        assert_eq!(c.delta_to_next, 5.0);
        assert!(c.progress_pct > 0.0 && c.progress_pct < 100.0);
        assert!((c.progress_pct - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_classify_below_and_elite() {
        let below = classify_lift(30.0, &example_thresholds());
        assert_eq!(below.tier, Tier::Below);
        assert_eq!(below.next_tier, Some(Tier::Beginner));
        assert_eq!(below.delta_to_next, 30.0);
        assert!((below.progress_pct - 50.0).abs() < 1e-9);

        let elite = classify_lift(160.0, &example_thresholds());
        assert_eq!(
            elite,
            LiftClassification {
                tier: Tier::Elite,
                next_tier: None,
                delta_to_next: 0.0,
                progress_pct: 100.0,
            }
        );
    }

    #[test]
    fn test_delta_rounds_up() {
        let c = classify_lift(97.2, &example_thresholds());
        assert_eq!(c.tier, Tier::Novice);
        assert_eq!(c.delta_to_next, 3.0);
    }

    #[test]
    fn test_classify_is_monotonic() {
        let thresholds = example_thresholds();
        let mut previous = (Tier::Below, 0.0);
        let mut value = 0.0;
        while value < 200.0 {
            let c = classify_lift(value, &thresholds);
            if c.tier == previous.0 {
                assert!(c.progress_pct >= previous.1, "pct dropped at {}", value);
            } else {
                assert!(c.tier > previous.0, "tier dropped at {}", value);
            }
            previous = (c.tier, c.progress_pct);
            value += 0.5;
        }
    }

    #[test]
    fn test_percentile_anchors() {
        let t = example_thresholds();
        assert_eq!(percentile(0.0, &t), 0.0);
        assert!((percentile(30.0, &t) - 2.5).abs() < 1e-9);
        assert!((percentile(60.0, &t) - 5.0).abs() < 1e-9);
        assert!((percentile(90.0, &t) - 35.0).abs() < 1e-9);
        assert!((percentile(130.0, &t) - 80.0).abs() < 1e-9);
        assert!((percentile(160.0, &t) - 95.0).abs() < 1e-9);
        let above = percentile(200.0, &t);
        assert!(above > 95.0 && above <= MAX_PERCENTILE);
        assert!(percentile(10_000.0, &t) <= MAX_PERCENTILE);
    }

    #[test]
    fn test_percentile_is_monotonic() {
        let t = example_thresholds();
        let mut last = percentile(0.0, &t);
        for step in 1..500 {
            let p = percentile(step as f64 * 0.5, &t);
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn test_exact_bracket_returns_raw_row() {
        let at_80 = standards_for_bodyweight(LiftCategory::BenchPress, 80.0);
        assert_eq!(at_80, TierThresholds::from_array(BENCH_PRESS[2]));
        let at_60 = standards_for_bodyweight(LiftCategory::Squat, 60.0);
        assert_eq!(at_60, TierThresholds::from_array(SQUAT[0]));
    }

    #[test]
    fn test_interpolation_and_clamping() {
        let mid = standards_for_bodyweight(LiftCategory::Deadlift, 85.0);
        assert!((mid.beginner - 90.5).abs() < 1e-9);
        assert!((mid.elite - 246.0).abs() < 1e-9);

        assert_eq!(
            standards_for_bodyweight(LiftCategory::Deadlift, 40.0),
            standards_for_bodyweight(LiftCategory::Deadlift, 60.0)
        );
        assert_eq!(
            standards_for_bodyweight(LiftCategory::Deadlift, 150.0),
            standards_for_bodyweight(LiftCategory::Deadlift, 120.0)
        );
    }

    #[test]
    fn test_interpolated_thresholds_are_monotonic() {
        for category in LiftCategory::ALL {
            let mut previous: Option<TierThresholds> = None;
            let mut bw = 55.0;
            while bw <= 125.0 {
                let t = standards_for_bodyweight(category, bw);
                let levels = t.as_array();
                assert!(levels.windows(2).all(|w| w[0] <= w[1]), "{} tiers at {}", category, bw);
                if let Some(prev) = previous {
                    for (a, b) in prev.as_array().iter().zip(levels.iter()) {
                        assert!(a <= b, "{} bodyweight at {}", category, bw);
                    }
                }
                previous = Some(t);
                bw += 2.5;
            }
        }
    }

    #[test]
    fn test_deceleration_table() {
        let factors: Vec<f64> = [Tier::Below]
            .iter()
            .chain(Tier::RANKED.iter())
            .map(|t| t.deceleration())
            .collect();
        assert_eq!(factors, vec![1.0, 0.85, 0.70, 0.55, 0.40, 0.25]);
    }
}
