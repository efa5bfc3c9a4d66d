//! Exercise catalog
//!
//! Maps free-text exercise names to an explicit tag (standards category,
//! equipment class, bodyweight-relative flag) once, at ingestion. This is the
//! only module that looks at exercise-name text; everything downstream works
//! with the tag.

use crate::error::AnalyticsError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lift families that have population strength standards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiftCategory {
    BenchPress,
    Squat,
    Deadlift,
    OverheadPress,
    BarbellRow,
    PullUp,
    Dip,
}

impl LiftCategory {
    pub const ALL: [LiftCategory; 7] = [
        LiftCategory::BenchPress,
        LiftCategory::Squat,
        LiftCategory::Deadlift,
        LiftCategory::OverheadPress,
        LiftCategory::BarbellRow,
        LiftCategory::PullUp,
        LiftCategory::Dip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LiftCategory::BenchPress => "bench_press",
            LiftCategory::Squat => "squat",
            LiftCategory::Deadlift => "deadlift",
            LiftCategory::OverheadPress => "overhead_press",
            LiftCategory::BarbellRow => "barbell_row",
            LiftCategory::PullUp => "pull_up",
            LiftCategory::Dip => "dip",
        }
    }

    /// Standards for these lifts are expressed as load added to the body
    pub fn is_bodyweight_relative(&self) -> bool {
        matches!(self, LiftCategory::PullUp | LiftCategory::Dip)
    }
}

impl std::fmt::Display for LiftCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LiftCategory {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        LiftCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| AnalyticsError::UnknownCategory(s.to_string()))
    }
}

/// Equipment classification, used to weigh how far a logged load can be
/// trusted as a free-weight equivalent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentClass {
    /// Barbell, dumbbell, kettlebell and bodyweight movements
    FreeWeight,
    Cable,
    /// Selectorized or guided machines
    Machine,
    /// Plate-loaded lever machines (Hammer Strength style); their loading is
    /// not comparable to free-weight kilograms
    LeverMachine,
    Unclassified,
}

impl EquipmentClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentClass::FreeWeight => "free_weight",
            EquipmentClass::Cable => "cable",
            EquipmentClass::Machine => "machine",
            EquipmentClass::LeverMachine => "lever_machine",
            EquipmentClass::Unclassified => "unclassified",
        }
    }

    /// Equipment trust factor (0-1)
    pub fn trust(&self) -> f64 {
        match self {
            EquipmentClass::FreeWeight => 1.0,
            EquipmentClass::Cable => 0.92,
            EquipmentClass::Machine => 0.82,
            EquipmentClass::LeverMachine => 0.55,
            EquipmentClass::Unclassified => 0.78,
        }
    }

    /// Whether estimates on this equipment may be compared against standards
    pub fn comparable_to_standards(&self) -> bool {
        !matches!(self, EquipmentClass::LeverMachine)
    }
}

/// Tag attached to every exercise at ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseTag {
    /// Standards category, if the exercise has one
    pub category: Option<LiftCategory>,
    pub equipment: EquipmentClass,
    /// Effective load includes the lifter's bodyweight
    pub bodyweight_relative: bool,
}

const LEVER_PATTERNS: &[&str] = &[
    "hammer strength",
    "plate loaded",
    "plate-loaded",
    "lever",
    "iso-lateral",
    "iso lateral",
];
const MACHINE_PATTERNS: &[&str] = &[
    "machine",
    "smith",
    "leg press",
    "hack squat",
    "pec deck",
    "leg extension",
    "leg curl",
];
const CABLE_PATTERNS: &[&str] = &["cable", "pulldown", "pushdown", "face pull", "crossover"];
const FREE_WEIGHT_PATTERNS: &[&str] = &[
    "barbell", "dumbbell", "kettlebell", "ez bar", "trap bar", "bodyweight", "weighted",
    "pull up", "pull-up", "pullup", "chin up", "chin-up", "chinup", "dip", "push up", "push-up",
];

fn contains_any(name: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| name.contains(p))
}

/// Classify a free-text exercise name
pub fn classify_exercise(name: &str) -> ExerciseTag {
    let lower = name.trim().to_lowercase();
    let equipment = classify_equipment(&lower);

    // Machine variants of a barbell lift do not share its standards
    let category = match equipment {
        EquipmentClass::Machine | EquipmentClass::LeverMachine | EquipmentClass::Cable => None,
        _ => classify_category(&lower),
    };

    let equipment = match (equipment, category) {
        (EquipmentClass::Unclassified, Some(_)) => EquipmentClass::FreeWeight,
        (equipment, _) => equipment,
    };

    ExerciseTag {
        category,
        equipment,
        bodyweight_relative: category.is_some_and(|c| c.is_bodyweight_relative()),
    }
}

fn classify_equipment(lower: &str) -> EquipmentClass {
    if contains_any(lower, LEVER_PATTERNS) {
        EquipmentClass::LeverMachine
    } else if contains_any(lower, MACHINE_PATTERNS) {
        EquipmentClass::Machine
    } else if contains_any(lower, CABLE_PATTERNS) {
        EquipmentClass::Cable
    } else if contains_any(lower, FREE_WEIGHT_PATTERNS) {
        EquipmentClass::FreeWeight
    } else {
        EquipmentClass::Unclassified
    }
}

fn classify_category(lower: &str) -> Option<LiftCategory> {
    if contains_any(lower, &["pull up", "pull-up", "pullup", "chin up", "chin-up", "chinup"]) {
        Some(LiftCategory::PullUp)
    } else if lower.contains("dip") {
        Some(LiftCategory::Dip)
    } else if lower.contains("bench press")
        && !contains_any(lower, &["incline", "decline", "dumbbell", "close grip", "close-grip"])
    {
        Some(LiftCategory::BenchPress)
    } else if lower.contains("deadlift")
        && !contains_any(lower, &["romanian", "stiff", "single leg", "single-leg", "deficit"])
    {
        Some(LiftCategory::Deadlift)
    } else if lower.contains("squat")
        && !contains_any(lower, &["front", "split", "goblet", "bulgarian", "overhead", "jump"])
    {
        Some(LiftCategory::Squat)
    } else if contains_any(lower, &["overhead press", "military press", "ohp"])
        && !lower.contains("dumbbell")
    {
        Some(LiftCategory::OverheadPress)
    } else if contains_any(
        lower,
        &["bent over row", "bent-over row", "barbell row", "pendlay row"],
    ) {
        Some(LiftCategory::BarbellRow)
    } else {
        None
    }
}
