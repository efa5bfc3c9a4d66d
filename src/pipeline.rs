//! Pipeline orchestration
//!
//! This module provides the public API for Ironsight. It runs the full chain
//! from a raw snapshot to a strength report:
//! snapshot → set aggregation → outlier screening and credibility → trend and
//! projection → standards classification → report encoding.

use crate::aggregator::{build_histories, AggregationStats, ExerciseHistories, ExerciseHistory};
use crate::bodyweight::BodyweightSeries;
use crate::config::EngineConfig;
use crate::credibility::{assess, CredibilityRecord};
use crate::encoder::ReportEncoder;
use crate::error::AnalyticsError;
use crate::overview::{build_overview, Overview};
use crate::snapshot::Snapshot;
use crate::standards::{classify_against_standards, StandardsClassification, Tier};
use crate::trend::{
    estimate_trend, project, projection_series, trend_series, ProjectionResult, TrendResult,
};
use crate::types::ExerciseReport;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Tier used to damp projections of exercises with no standards comparison
pub const UNCLASSIFIED_PROJECTION_TIER: Tier = Tier::Intermediate;

/// Parse a `YYYY-MM-DD` evaluation date
pub fn parse_date(raw: &str) -> Result<NaiveDate, AnalyticsError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| AnalyticsError::DateParseError(format!("{raw:?}: {e}")))
}

/// Computed analytics for one exercise
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseAnalysis {
    pub history: ExerciseHistory,
    pub credibility: CredibilityRecord,
    pub trend: Option<TrendResult>,
    pub projection: Option<ProjectionResult>,
    pub standards: Option<StandardsClassification>,
}

/// Immutable analysis of one snapshot as of one evaluation date
#[derive(Debug, Clone)]
pub struct Analysis {
    today: NaiveDate,
    generated_at: Option<DateTime<Utc>>,
    config: EngineConfig,
    bodyweight: BodyweightSeries,
    histories: ExerciseHistories,
    exercises: Vec<ExerciseAnalysis>,
    overview: Overview,
}

impl Analysis {
    /// Run every stage over a parsed snapshot. The configuration is validated
    /// first.
    pub fn build(
        snapshot: &Snapshot,
        today: NaiveDate,
        config: EngineConfig,
    ) -> Result<Self, AnalyticsError> {
        config.validate()?;
        Ok(Self::compute(snapshot, today, config))
    }

    /// Parse a raw snapshot and analyze it
    pub fn from_json(
        raw_json: &str,
        today: NaiveDate,
        config: EngineConfig,
    ) -> Result<Self, AnalyticsError> {
        config.validate()?;
        let snapshot = Snapshot::from_json(raw_json)?;
        Ok(Self::compute(&snapshot, today, config))
    }

    /// Every stage, for a configuration that has already passed `validate`
    fn compute(snapshot: &Snapshot, today: NaiveDate, config: EngineConfig) -> Self {
        let bodyweight = BodyweightSeries::from_snapshot(snapshot);
        let histories = build_histories(&snapshot.workouts, &bodyweight, &config);

        let exercises: Vec<ExerciseAnalysis> = histories
            .iter_ranked()
            .filter_map(|history| analyze_exercise(history, &bodyweight, today, &config))
            .collect();

        debug!(
            exercises = exercises.len(),
            with_trend = exercises.iter().filter(|e| e.trend.is_some()).count(),
            with_standards = exercises.iter().filter(|e| e.standards.is_some()).count(),
            %today,
            "Analysis complete"
        );

        Self {
            today,
            generated_at: snapshot.generated_at,
            overview: build_overview(snapshot, today),
            config,
            bodyweight,
            histories,
            exercises,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.generated_at
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bodyweight(&self) -> &BodyweightSeries {
        &self.bodyweight
    }

    pub fn histories(&self) -> &ExerciseHistories {
        &self.histories
    }

    pub fn stats(&self) -> &AggregationStats {
        &self.histories.stats
    }

    pub fn overview(&self) -> &Overview {
        &self.overview
    }

    /// Exercises in ranking order
    pub fn exercises(&self) -> &[ExerciseAnalysis] {
        &self.exercises
    }

    pub fn exercise(&self, name: &str) -> Option<&ExerciseAnalysis> {
        let name = name.trim();
        self.exercises.iter().find(|e| e.history.name == name)
    }

    /// Report entries for every exercise, in ranking order
    pub fn exercise_reports(&self) -> Vec<ExerciseReport> {
        self.exercises
            .iter()
            .enumerate()
            .map(|(i, e)| to_report(e, i + 1))
            .collect()
    }

    /// Report entry for a single exercise
    pub fn exercise_report(&self, name: &str) -> Result<ExerciseReport, AnalyticsError> {
        let name = name.trim();
        self.exercises
            .iter()
            .position(|e| e.history.name == name)
            .map(|i| to_report(&self.exercises[i], i + 1))
            .ok_or_else(|| AnalyticsError::UnknownExercise(name.to_string()))
    }
}

fn to_report(exercise: &ExerciseAnalysis, rank: usize) -> ExerciseReport {
    ExerciseReport {
        name: exercise.history.name.clone(),
        rank,
        tag: exercise.history.tag,
        session_count: exercise.history.session_count(),
        history: exercise.history.entries.clone(),
        credibility: exercise.credibility.clone(),
        trend: exercise.trend.clone(),
        projection: exercise.projection.clone(),
        standards: exercise.standards.clone(),
    }
}

fn analyze_exercise(
    history: &ExerciseHistory,
    bodyweight: &BodyweightSeries,
    today: NaiveDate,
    config: &EngineConfig,
) -> Option<ExerciseAnalysis> {
    let credibility = assess(history, today, config)?;
    let trend_values = trend_series(history, config.trend_basis, bodyweight, config);
    let trend = estimate_trend(&trend_values, config);
    let standards = classify_against_standards(history, &credibility, bodyweight, today, config);

    // Projection lives on the same scale as the standards comparison
    let (current, tier) = match &standards {
        Some(s) => (s.compared_value, s.tier),
        None => (credibility.credible_estimate, UNCLASSIFIED_PROJECTION_TIER),
    };
    let series = projection_series(history, bodyweight, config);
    let projection = project(current, tier, &series, today, config);

    Some(ExerciseAnalysis {
        history: history.clone(),
        credibility,
        trend,
        projection,
        standards,
    })
}

/// Analyze a raw snapshot JSON string with the default configuration.
///
/// # Arguments
/// * `raw_json` - Snapshot document
/// * `today` - Evaluation date; every recency computation is relative to it
///
/// # Returns
/// The strength report as pretty-printed JSON
///
/// # Example
/// ```ignore
/// let report = analyze_snapshot(&snapshot_json, today)?;
/// ```
pub fn analyze_snapshot(raw_json: &str, today: NaiveDate) -> Result<String, AnalyticsError> {
    analyze_snapshot_with_config(raw_json, today, EngineConfig::default())
}

/// Analyze a raw snapshot JSON string with an explicit configuration
pub fn analyze_snapshot_with_config(
    raw_json: &str,
    today: NaiveDate,
    config: EngineConfig,
) -> Result<String, AnalyticsError> {
    let analysis = Analysis::from_json(raw_json, today, config)?;
    ReportEncoder::new().encode_to_json(&analysis)
}

/// Holds the current analysis and replaces it wholesale on reload.
///
/// Readers take an `Arc<Analysis>` and keep a consistent view even while a
/// reload swaps in a newer one.
pub struct StrengthProcessor {
    config: EngineConfig,
    encoder: ReportEncoder,
    current: Option<Arc<Analysis>>,
}

impl Default for StrengthProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl StrengthProcessor {
    /// Create a processor with the default configuration
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            encoder: ReportEncoder::new(),
            current: None,
        }
    }

    /// Create a processor with a validated configuration
    pub fn with_config(config: EngineConfig) -> Result<Self, AnalyticsError> {
        config.validate()?;
        Ok(Self {
            config,
            encoder: ReportEncoder::new(),
            current: None,
        })
    }

    /// Load engine configuration from JSON; takes effect on the next reload
    pub fn load_config(&mut self, json: &str) -> Result<(), AnalyticsError> {
        self.config = EngineConfig::from_json(json)?;
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rebuild the analysis from a raw snapshot. On failure the previous
    /// analysis stays in place.
    pub fn reload(
        &mut self,
        raw_json: &str,
        today: NaiveDate,
    ) -> Result<Arc<Analysis>, AnalyticsError> {
        let snapshot = Snapshot::from_json(raw_json)?;
        Ok(self.reload_snapshot(&snapshot, today))
    }

    /// Rebuild the analysis from an already parsed snapshot
    pub fn reload_snapshot(&mut self, snapshot: &Snapshot, today: NaiveDate) -> Arc<Analysis> {
        // Every path that sets `self.config` validates it
        let analysis = Arc::new(Analysis::compute(snapshot, today, self.config.clone()));
        info!(
            exercises = analysis.exercises().len(),
            sets_used = analysis.stats().sets_used,
            %today,
            "Strength analysis reloaded"
        );
        self.current = Some(Arc::clone(&analysis));
        analysis
    }

    /// The current analysis, if a snapshot has been loaded
    pub fn current(&self) -> Option<Arc<Analysis>> {
        self.current.clone()
    }

    /// Encode the current analysis as JSON
    pub fn report_json(&self) -> Result<String, AnalyticsError> {
        let analysis = self.current.as_ref().ok_or(AnalyticsError::NotLoaded)?;
        self.encoder.encode_to_json(analysis)
    }
}
