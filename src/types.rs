//! Report types
//!
//! The output contract consumed by the dashboard: one `StrengthReport` per
//! analysis, carrying producer metadata, the ranked per-exercise analytics and
//! the body/nutrition overview.

use crate::aggregator::{AggregationStats, HistoryEntry};
use crate::catalog::ExerciseTag;
use crate::credibility::CredibilityRecord;
use crate::overview::Overview;
use crate::standards::StandardsClassification;
use crate::trend::{ProjectionResult, TrendResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerInfo {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Everything computed for one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseReport {
    pub name: String,
    /// 1-based position in the session-count ranking
    pub rank: usize,
    pub tag: ExerciseTag,
    pub session_count: usize,
    pub history: Vec<HistoryEntry>,
    pub credibility: CredibilityRecord,
    /// None below three sessions
    pub trend: Option<TrendResult>,
    /// None when the history is too short or not rising
    pub projection: Option<ProjectionResult>,
    /// None for exercises without comparable standards
    pub standards: Option<StandardsClassification>,
}

/// Complete analysis output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthReport {
    pub producer: ProducerInfo,
    /// Date the analysis was evaluated as of
    pub evaluated_on: NaiveDate,
    /// When the input snapshot was generated, if it says
    pub snapshot_generated_at: Option<DateTime<Utc>>,
    pub computed_at: DateTime<Utc>,
    /// Exercises in ranking order
    pub exercises: Vec<ExerciseReport>,
    pub overview: Overview,
    pub stats: AggregationStats,
}

impl StrengthReport {
    pub fn exercise(&self, name: &str) -> Option<&ExerciseReport> {
        let name = name.trim();
        self.exercises.iter().find(|e| e.name == name)
    }
}
