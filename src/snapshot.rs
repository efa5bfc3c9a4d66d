//! Snapshot input contract
//!
//! The dashboard snapshot is a single JSON document produced by an external
//! exporter. Only the fields the strength engine and overview read are modeled;
//! everything else is ignored. Every list defaults to empty and every numeric
//! field may be null, so a partial snapshot still loads.

use crate::error::AnalyticsError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// The full dashboard snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the exporter produced this document. Timestamps without an offset
    /// are read as UTC; unreadable ones become None.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub generated_at: Option<DateTime<Utc>>,
    /// Workout sessions, in any order
    #[serde(default)]
    pub workouts: Vec<WorkoutSession>,
    /// Body composition records
    #[serde(default)]
    pub body_comp: Vec<BodyCompRecord>,
    /// Daily nutrition totals
    #[serde(default)]
    pub nutrition: Vec<NutritionDay>,
    /// Precomputed summary figures
    #[serde(default)]
    pub summary: Summary,
    /// Volume landmark configuration, passed through untouched
    #[serde(default)]
    pub config: serde_json::Value,
}

impl Snapshot {
    /// Parse a snapshot from a JSON string
    pub fn from_json(json: &str) -> Result<Self, AnalyticsError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Ok(snapshot)
    }

    /// Read and parse a snapshot file. A single attempt; failures are returned
    /// to the caller as-is.
    pub fn from_path(path: &Path) -> Result<Self, AnalyticsError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Total number of set records across all sessions
    pub fn set_count(&self) -> usize {
        self.workouts.iter().map(|w| w.sets.len()).sum()
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(raw)) => {
            let parsed = parse_timestamp(&raw);
            if parsed.is_none() {
                warn!(generated_at = %raw, "Unreadable snapshot timestamp, ignoring");
            }
            parsed
        }
        Some(other) => {
            warn!(generated_at = %other, "Snapshot timestamp is not a string, ignoring");
            None
        }
    })
}

/// One workout session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub date: NaiveDate,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "duration")]
    pub duration_min: Option<f64>,
    #[serde(default)]
    pub sets: Vec<SetRecord>,
}

/// One logged set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRecord {
    /// Free-text exercise name as logged
    pub exercise: String,
    /// Signed load in kg; negative means assistance (band or counterweight)
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub reps: Option<f64>,
    /// Reps in reserve
    #[serde(default)]
    pub rir: Option<f64>,
    #[serde(default)]
    pub set_type: Option<SetType>,
}

impl SetRecord {
    /// Whether this set is excluded from estimation by its tag
    pub fn is_drop_set(&self) -> bool {
        matches!(self.set_type, Some(SetType::Drop))
    }

    /// Usable rep count, if any
    pub fn rep_count(&self) -> Option<u32> {
        self.reps
            .filter(|r| r.is_finite() && *r >= 1.0)
            .map(|r| r.round() as u32)
    }
}

/// Set-type tag as exported by the tracking app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SetType {
    Normal,
    Drop,
    Failure,
    Warmup,
    /// Any tag the engine does not interpret
    Other(String),
}

impl SetType {
    pub fn as_str(&self) -> &str {
        match self {
            SetType::Normal => "Normal",
            SetType::Drop => "Drop",
            SetType::Failure => "Failure Set",
            SetType::Warmup => "Warmup",
            SetType::Other(tag) => tag.as_str(),
        }
    }
}

impl From<String> for SetType {
    fn from(raw: String) -> Self {
        let tag = raw.trim().to_lowercase();
        if tag.is_empty() || tag == "normal" {
            SetType::Normal
        } else if tag.contains("drop") {
            SetType::Drop
        } else if tag.contains("fail") {
            SetType::Failure
        } else if tag.contains("warm") {
            SetType::Warmup
        } else {
            SetType::Other(raw)
        }
    }
}

impl From<SetType> for String {
    fn from(set_type: SetType) -> Self {
        set_type.as_str().to_string()
    }
}

/// One body composition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyCompRecord {
    pub date: NaiveDate,
    /// Smoothed bodyweight trend (kg)
    #[serde(default)]
    pub trend_kg: Option<f64>,
    /// Raw scale reading (kg)
    #[serde(default)]
    pub weight_kg: Option<f64>,
    /// Body fat percentage
    #[serde(default, alias = "body_fat_pct")]
    pub fat_pct: Option<f64>,
}

impl BodyCompRecord {
    /// Bodyweight for this record, preferring the smoothed trend
    pub fn bodyweight_kg(&self) -> Option<f64> {
        self.trend_kg
            .or(self.weight_kg)
            .filter(|kg| kg.is_finite() && *kg > 0.0)
    }
}

/// Daily nutrition totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub kcal: Option<f64>,
    #[serde(default)]
    pub protein_g: Option<f64>,
    #[serde(default)]
    pub carbs_g: Option<f64>,
    #[serde(default)]
    pub fat_g: Option<f64>,
}

/// Precomputed summary block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    /// Current bodyweight trend (kg)
    #[serde(default)]
    pub trend_kg: Option<f64>,
    /// Fields the engine does not interpret
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "generated_at": "2024-03-01T08:00:00Z",
            "workouts": [
                {
                    "date": "2024-02-28",
                    "title": "Push",
                    "duration_min": 62,
                    "sets": [
                        { "exercise": "Bench Press (Barbell)", "weight_kg": 80, "reps": 5,
                          "rir": 2, "set_type": "Normal" },
                        { "exercise": "Bench Press (Barbell)", "weight_kg": 60, "reps": 12,
                          "rir": null, "set_type": "Drop" },
                        { "exercise": "Chest Dip", "weight_kg": -10, "reps": 8,
                          "set_type": "Failure Set" }
                    ]
                }
            ],
            "body_comp": [ { "date": "2024-02-27", "trend_kg": 81.2, "fat_pct": 17.5 } ],
            "summary": { "trend_kg": 81.2, "weekly_rate": -0.2 },
            "config": { "volume_landmarks": {}, "muscle_landmarks": {} }
        }"#
    }

    #[test]
    fn test_parse_full_snapshot() {
        let snapshot = Snapshot::from_json(sample_json()).unwrap();
        assert!(snapshot.generated_at.is_some());
        assert_eq!(snapshot.workouts.len(), 1);
        assert_eq!(snapshot.set_count(), 3);
        assert_eq!(snapshot.body_comp[0].bodyweight_kg(), Some(81.2));
        assert_eq!(snapshot.summary.trend_kg, Some(81.2));
        assert!(snapshot.summary.extra.contains_key("weekly_rate"));
        assert!(snapshot.nutrition.is_empty());
    }

    #[test]
    fn test_set_type_tags() {
        let snapshot = Snapshot::from_json(sample_json()).unwrap();
        let sets = &snapshot.workouts[0].sets;
        assert_eq!(sets[0].set_type, Some(SetType::Normal));
        assert!(sets[1].is_drop_set());
        assert_eq!(sets[2].set_type, Some(SetType::Failure));
        assert_eq!(SetType::from("Super Set".to_string()), SetType::Other("Super Set".to_string()));
    }

    #[test]
    fn test_rep_count_filters_missing_and_zero() {
        let set = SetRecord {
            exercise: "Squat".to_string(),
            weight_kg: Some(100.0),
            reps: Some(0.0),
            rir: None,
            set_type: None,
        };
        assert_eq!(set.rep_count(), None);
        let set = SetRecord { reps: Some(5.0), ..set };
        assert_eq!(set.rep_count(), Some(5));
        let set = SetRecord { reps: None, ..set };
        assert_eq!(set.rep_count(), None);
    }

    #[test]
    fn test_empty_document_loads() {
        let snapshot = Snapshot::from_json("{}").unwrap();
        assert!(snapshot.workouts.is_empty());
        assert!(snapshot.generated_at.is_none());
    }

    #[test]
    fn test_local_timestamp_is_read_as_utc() {
        let snapshot =
            Snapshot::from_json(r#"{"generated_at":"2024-03-01T08:00:00","workouts":[]}"#).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(snapshot.generated_at, Some(expected));

        let offset =
            Snapshot::from_json(r#"{"generated_at":"2024-03-01T10:00:00+02:00"}"#).unwrap();
        assert_eq!(offset.generated_at, Some(expected));
    }

    #[test]
    fn test_unreadable_timestamp_is_dropped() {
        let snapshot = Snapshot::from_json(
            r#"{"generated_at":"last tuesday","workouts":[{"date":"2024-02-28","sets":[]}]}"#,
        )
        .unwrap();
        assert!(snapshot.generated_at.is_none());
        assert_eq!(snapshot.workouts.len(), 1);

        let numeric = Snapshot::from_json(r#"{"generated_at":1709280000}"#).unwrap();
        assert!(numeric.generated_at.is_none());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            Snapshot::from_json("not json"),
            Err(AnalyticsError::JsonError(_))
        ));
    }

    #[test]
    fn test_bodyweight_prefers_trend() {
        let record = BodyCompRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            trend_kg: None,
            weight_kg: Some(79.5),
            fat_pct: None,
        };
        assert_eq!(record.bodyweight_kg(), Some(79.5));
        let record = BodyCompRecord { trend_kg: Some(80.1), ..record };
        assert_eq!(record.bodyweight_kg(), Some(80.1));
    }
}
