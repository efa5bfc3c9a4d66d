//! Report encoding
//!
//! Wraps per-exercise analytics into a `StrengthReport` stamped with producer
//! metadata and serializes it to JSON.

use crate::error::AnalyticsError;
use crate::overview::Overview;
use crate::pipeline::Analysis;
use crate::types::{ExerciseReport, ProducerInfo, StrengthReport};
use crate::{IRONSIGHT_VERSION, PRODUCER_NAME};
use chrono::Utc;
use uuid::Uuid;

/// Report encoder; every report it produces carries the same instance ID
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    fn producer(&self) -> ProducerInfo {
        ProducerInfo {
            name: PRODUCER_NAME.to_string(),
            version: IRONSIGHT_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        }
    }

    /// Build the report for an analysis
    pub fn encode(&self, analysis: &Analysis) -> StrengthReport {
        self.encode_exercises(analysis, analysis.exercise_reports(), analysis.overview().clone())
    }

    /// Build a report holding only the given exercises
    pub fn encode_exercises(
        &self,
        analysis: &Analysis,
        exercises: Vec<ExerciseReport>,
        overview: Overview,
    ) -> StrengthReport {
        StrengthReport {
            producer: self.producer(),
            evaluated_on: analysis.today(),
            snapshot_generated_at: analysis.generated_at(),
            computed_at: Utc::now(),
            exercises,
            overview,
            stats: analysis.stats().clone(),
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(&self, analysis: &Analysis) -> Result<String, AnalyticsError> {
        let report = self.encode(analysis);
        serde_json::to_string_pretty(&report).map_err(AnalyticsError::JsonError)
    }

    /// One compact JSON line per exercise report, newline terminated
    pub fn encode_to_ndjson(&self, exercises: &[ExerciseReport]) -> Result<String, AnalyticsError> {
        let mut out = String::new();
        for exercise in exercises {
            out.push_str(&serde_json::to_string(exercise)?);
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::snapshot::Snapshot;
    use chrono::NaiveDate;

    fn sample_analysis() -> Analysis {
        let snapshot = Snapshot::from_json(
            r#"{
                "generated_at": "2024-06-01T08:00:00Z",
                "workouts": [
                    {"date": "2024-05-20", "sets": [
                        {"exercise": "Deadlift", "weight_kg": 180, "reps": 3}
                    ]},
                    {"date": "2024-05-27", "sets": [
                        {"exercise": "Deadlift", "weight_kg": 185, "reps": 3}
                    ]}
                ]
            }"#,
        )
        .unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        Analysis::build(&snapshot, today, EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_encode_report() {
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode(&sample_analysis());

        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.version, IRONSIGHT_VERSION);
        assert_eq!(report.producer.instance_id, "test-instance");
        assert_eq!(report.evaluated_on, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(report.snapshot_generated_at.is_some());
        assert_eq!(report.exercises.len(), 1);
        assert_eq!(report.exercises[0].name, "Deadlift");
        assert_eq!(report.stats.sets_used, 2);
    }

    #[test]
    fn test_encode_to_json() {
        let encoder = ReportEncoder::new();
        let json = encoder.encode_to_json(&sample_analysis()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed.get("producer").is_some());
        assert!(parsed.get("exercises").is_some());
        assert!(parsed.get("overview").is_some());
        assert!(parsed["exercises"][0].get("credibility").is_some());
    }

    #[test]
    fn test_encode_to_ndjson() {
        let analysis = sample_analysis();
        let ndjson = ReportEncoder::new().encode_to_ndjson(&analysis.exercise_reports()).unwrap();
        let lines: Vec<&str> = ndjson.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(ndjson.ends_with('\n'));
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["name"], "Deadlift");

        assert_eq!(ReportEncoder::new().encode_to_ndjson(&[]).unwrap(), "");
    }

    #[test]
    fn test_instance_ids_are_unique() {
        assert_ne!(ReportEncoder::new().instance_id(), ReportEncoder::new().instance_id());
    }
}
