//! Set aggregation
//!
//! Reduces raw per-set workout logs into one best estimated-1RM entry per
//! exercise per session. Assisted and bodyweight-relative lifts have their
//! effective load resolved against the bodyweight series.

use crate::bodyweight::BodyweightSeries;
use crate::catalog::{classify_exercise, ExerciseTag};
use crate::config::EngineConfig;
use crate::snapshot::{SetRecord, WorkoutSession};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Estimated one-rep max from a sub-maximal set, `load × (1 + reps/30)`
pub fn estimated_one_rep_max(load_kg: f64, reps: u32) -> f64 {
    load_kg * (1.0 + reps as f64 / 30.0)
}

/// Best set of one exercise in one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    /// Load actually moved (kg), bodyweight included for assisted and
    /// bodyweight-relative lifts
    pub effective_load: f64,
    pub reps: u32,
    pub estimated_1rm: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rir: Option<f64>,
    pub is_assisted: bool,
}

/// Chronological best-per-session history of one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseHistory {
    pub name: String,
    pub tag: ExerciseTag,
    pub entries: Vec<HistoryEntry>,
}

impl ExerciseHistory {
    /// Number of sessions this exercise was trained in
    pub fn session_count(&self) -> usize {
        self.entries.len()
    }

    pub fn estimates(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.estimated_1rm).collect()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(|e| e.date)
    }
}

/// Why a set did not contribute to any history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    DropSet,
    MissingLoad,
    MissingReps,
    NonPositiveLoad,
    UnnamedExercise,
}

/// Counters describing how the snapshot's sets were used
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationStats {
    pub sessions: usize,
    pub sets_total: usize,
    pub sets_used: usize,
    pub skipped_drop_sets: usize,
    pub skipped_missing_load: usize,
    pub skipped_missing_reps: usize,
    pub skipped_non_positive_load: usize,
    pub skipped_unnamed: usize,
    /// Sets whose load was resolved with the default bodyweight
    pub default_bodyweight_sets: usize,
    pub exercises: usize,
}

impl AggregationStats {
    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::DropSet => self.skipped_drop_sets += 1,
            SkipReason::MissingLoad => self.skipped_missing_load += 1,
            SkipReason::MissingReps => self.skipped_missing_reps += 1,
            SkipReason::NonPositiveLoad => self.skipped_non_positive_load += 1,
            SkipReason::UnnamedExercise => self.skipped_unnamed += 1,
        }
    }

    pub fn sets_skipped(&self) -> usize {
        self.sets_total - self.sets_used
    }
}

/// All exercise histories built from one snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseHistories {
    histories: BTreeMap<String, ExerciseHistory>,
    ranking: Vec<String>,
    pub stats: AggregationStats,
}

impl ExerciseHistories {
    pub fn get(&self, name: &str) -> Option<&ExerciseHistory> {
        self.histories.get(name.trim())
    }

    /// Exercise names by session count (descending), then name
    pub fn ranked_exercises(&self) -> &[String] {
        &self.ranking
    }

    /// Histories in ranking order
    pub fn iter_ranked(&self) -> impl Iterator<Item = &ExerciseHistory> {
        self.ranking.iter().filter_map(|name| self.histories.get(name))
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

/// Build per-exercise histories from workout sessions
pub fn build_histories(
    sessions: &[WorkoutSession],
    bodyweight: &BodyweightSeries,
    config: &EngineConfig,
) -> ExerciseHistories {
    let mut stats = AggregationStats {
        sessions: sessions.len(),
        ..Default::default()
    };
    let mut histories: BTreeMap<String, ExerciseHistory> = BTreeMap::new();
    let mut tags: HashMap<String, ExerciseTag> = HashMap::new();

    // Exporters list sessions newest-first; stable sort keeps same-day order
    let mut ordered: Vec<&WorkoutSession> = sessions.iter().collect();
    ordered.sort_by_key(|s| s.date);

    for session in ordered {
        let mut best: BTreeMap<&str, HistoryEntry> = BTreeMap::new();

        for set in &session.sets {
            stats.sets_total += 1;
            let name = set.exercise.trim();
            let tag = *tags
                .entry(name.to_string())
                .or_insert_with(|| classify_exercise(name));

            match resolve_set(set, &tag, session.date, bodyweight, config, &mut stats) {
                Ok(entry) => {
                    stats.sets_used += 1;
                    let replace = best
                        .get(name)
                        .map_or(true, |current| entry.estimated_1rm > current.estimated_1rm);
                    if replace {
                        best.insert(name, entry);
                    }
                }
                Err(reason) => stats.record_skip(reason),
            }
        }

        for (name, entry) in best {
            histories
                .entry(name.to_string())
                .or_insert_with(|| ExerciseHistory {
                    name: name.to_string(),
                    tag: tags[name],
                    entries: Vec::new(),
                })
                .entries
                .push(entry);
        }
    }

    if stats.default_bodyweight_sets > 0 {
        warn!(
            sets = stats.default_bodyweight_sets,
            default_kg = config.default_bodyweight_kg,
            "No bodyweight data available; assisted loads use the default bodyweight"
        );
    }

    let mut ranking: Vec<String> = histories.keys().cloned().collect();
    ranking.sort_by(|a, b| {
        histories[b]
            .session_count()
            .cmp(&histories[a].session_count())
            .then_with(|| a.cmp(b))
    });

    stats.exercises = histories.len();
    debug!(
        sessions = stats.sessions,
        sets_used = stats.sets_used,
        sets_skipped = stats.sets_skipped(),
        exercises = stats.exercises,
        "Built exercise histories"
    );

    ExerciseHistories {
        histories,
        ranking,
        stats,
    }
}

fn resolve_set(
    set: &SetRecord,
    tag: &ExerciseTag,
    date: NaiveDate,
    bodyweight: &BodyweightSeries,
    config: &EngineConfig,
    stats: &mut AggregationStats,
) -> Result<HistoryEntry, SkipReason> {
    if set.exercise.trim().is_empty() {
        return Err(SkipReason::UnnamedExercise);
    }
    if set.is_drop_set() {
        return Err(SkipReason::DropSet);
    }
    let load = set
        .weight_kg
        .filter(|w| w.is_finite())
        .ok_or(SkipReason::MissingLoad)?;
    let reps = set.rep_count().ok_or(SkipReason::MissingReps)?;

    let is_assisted = load < 0.0;
    let effective_load = if is_assisted || tag.bodyweight_relative {
        let body = bodyweight.resolve(date).unwrap_or_else(|| {
            stats.default_bodyweight_sets += 1;
            config.default_bodyweight_kg
        });
        if is_assisted {
            body - load.abs()
        } else {
            body + load
        }
    } else {
        load
    };

    if effective_load <= 0.0 {
        return Err(SkipReason::NonPositiveLoad);
    }

    Ok(HistoryEntry {
        date,
        effective_load,
        reps,
        estimated_1rm: estimated_one_rep_max(effective_load, reps),
        rir: set.rir,
        is_assisted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SetType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn set(exercise: &str, weight: Option<f64>, reps: Option<f64>) -> SetRecord {
        SetRecord {
            exercise: exercise.to_string(),
            weight_kg: weight,
            reps,
            rir: None,
            set_type: Some(SetType::Normal),
        }
    }

    fn session(d: NaiveDate, sets: Vec<SetRecord>) -> WorkoutSession {
        WorkoutSession {
            date: d,
            title: Some("Workout".to_string()),
            duration_min: Some(60.0),
            sets,
        }
    }

    fn histories_without_bodyweight(sessions: &[WorkoutSession]) -> ExerciseHistories {
        build_histories(sessions, &BodyweightSeries::new(), &EngineConfig::default())
    }

    #[test]
    fn test_estimated_one_rep_max() {
        assert!((estimated_one_rep_max(100.0, 5) - 116.666_666).abs() < 1e-3);
        assert_eq!(estimated_one_rep_max(100.0, 0), 100.0);
    }

    #[test]
    fn test_assisted_set_uses_bodyweight() {
        let mut bw = BodyweightSeries::new();
        bw.insert(date(2024, 1, 1), 80.0);
        let sessions = vec![session(
            date(2024, 1, 5),
            vec![set("Chest Dip", Some(-10.0), Some(8.0))],
        )];

        let histories = build_histories(&sessions, &bw, &EngineConfig::default());
        let entry = &histories.get("Chest Dip").unwrap().entries[0];

        assert_eq!(entry.effective_load, 70.0);
        assert!(entry.is_assisted);
        assert!((entry.estimated_1rm - 88.67).abs() < 0.01);
    }

    #[test]
    fn test_assisted_set_without_bodyweight_uses_default() {
        let sessions = vec![session(
            date(2024, 1, 5),
            vec![set("Lat Assist", Some(-20.0), Some(10.0))],
        )];
        let histories = histories_without_bodyweight(&sessions);

        let entry = &histories.get("Lat Assist").unwrap().entries[0];
        assert_eq!(entry.effective_load, 60.0);
        assert_eq!(histories.stats.default_bodyweight_sets, 1);
    }

    #[test]
    fn test_weighted_pull_up_adds_bodyweight() {
        let mut bw = BodyweightSeries::new();
        bw.insert(date(2024, 1, 1), 75.0);
        let sessions = vec![session(
            date(2024, 1, 5),
            vec![set("Pull Up (Weighted)", Some(10.0), Some(5.0))],
        )];

        let histories = build_histories(&sessions, &bw, &EngineConfig::default());
        let entry = &histories.get("Pull Up (Weighted)").unwrap().entries[0];
        assert_eq!(entry.effective_load, 85.0);
        assert!(!entry.is_assisted);
    }

    #[test]
    fn test_best_set_per_session_only() {
        let sessions = vec![session(
            date(2024, 1, 5),
            vec![
                set("Squat", Some(100.0), Some(5.0)),
                set("Squat", Some(110.0), Some(3.0)),
                set("Squat", Some(90.0), Some(10.0)),
            ],
        )];
        let histories = histories_without_bodyweight(&sessions);
        let squat = histories.get("Squat").unwrap();

        assert_eq!(squat.session_count(), 1);
        // 110 x 3 -> 121.0 beats 90 x 10 -> 120.0 and 100 x 5 -> 116.7
        assert_eq!(squat.entries[0].effective_load, 110.0);
        assert_eq!(histories.stats.sets_used, 3);
    }

    #[test]
    fn test_skipped_sets_are_counted() {
        let mut drop = set("Bench Press", Some(60.0), Some(12.0));
        drop.set_type = Some(SetType::Drop);
        let sessions = vec![session(
            date(2024, 1, 5),
            vec![
                drop,
                set("Bench Press", None, Some(5.0)),
                set("Bench Press", Some(80.0), None),
                set("Bench Press", Some(0.0), Some(5.0)),
                set("  ", Some(50.0), Some(5.0)),
            ],
        )];
        let histories = histories_without_bodyweight(&sessions);

        assert!(histories.is_empty());
        let stats = &histories.stats;
        assert_eq!(stats.sets_total, 5);
        assert_eq!(stats.sets_used, 0);
        assert_eq!(stats.skipped_drop_sets, 1);
        assert_eq!(stats.skipped_missing_load, 1);
        assert_eq!(stats.skipped_missing_reps, 1);
        assert_eq!(stats.skipped_non_positive_load, 1);
        assert_eq!(stats.skipped_unnamed, 1);
        assert_eq!(stats.sets_skipped(), 5);
    }

    #[test]
    fn test_histories_are_chronological() {
        let sessions = vec![
            session(date(2024, 1, 20), vec![set("Deadlift", Some(150.0), Some(3.0))]),
            session(date(2024, 1, 10), vec![set("Deadlift", Some(140.0), Some(3.0))]),
        ];
        let histories = histories_without_bodyweight(&sessions);
        let dates: Vec<NaiveDate> =
            histories.get("Deadlift").unwrap().entries.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 10), date(2024, 1, 20)]);
    }

    #[test]
    fn test_ranking_by_session_count() {
        let sessions = vec![
            session(
                date(2024, 1, 1),
                vec![
                    set("Squat", Some(100.0), Some(5.0)),
                    set("Bench Press", Some(80.0), Some(5.0)),
                ],
            ),
            session(date(2024, 1, 3), vec![set("Bench Press", Some(82.5), Some(5.0))]),
            session(
                date(2024, 1, 5),
                vec![
                    set("Bench Press", Some(85.0), Some(5.0)),
                    set("Curl", Some(20.0), Some(10.0)),
                ],
            ),
        ];
        let histories = histories_without_bodyweight(&sessions);
        assert_eq!(
            histories.ranked_exercises(),
            &["Bench Press".to_string(), "Curl".to_string(), "Squat".to_string()]
        );
        assert_eq!(histories.iter_ranked().count(), 3);
    }
}
