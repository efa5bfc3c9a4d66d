//! Body and nutrition overview
//!
//! Headline figures shown next to the strength analytics: the latest
//! bodyweight and its change, the recent bodyweight chart, body fat, the day's
//! nutrition and the most recent workout.

use crate::bodyweight::BodyweightSeries;
use crate::snapshot::{NutritionDay, Snapshot, WorkoutSession};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Default bodyweight chart window
pub const DEFAULT_WINDOW_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyweightPoint {
    pub date: NaiveDate,
    pub kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyweightCard {
    pub date: NaiveDate,
    pub kg: f64,
    /// Change against the previous reading
    pub change_kg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyFatCard {
    pub date: NaiveDate,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionCard {
    pub date: NaiveDate,
    /// False when no entry exists for the evaluation date and the most recent
    /// day is shown instead
    pub is_today: bool,
    pub kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
}

impl NutritionCard {
    fn from_day(day: &NutritionDay, today: NaiveDate) -> Self {
        Self {
            date: day.date,
            is_today: day.date == today,
            kcal: day.kcal,
            protein_g: day.protein_g,
            carbs_g: day.carbs_g,
            fat_g: day.fat_g,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutCard {
    pub date: NaiveDate,
    pub title: String,
    pub duration_min: Option<f64>,
    pub set_count: usize,
    pub total_reps: u64,
}

impl WorkoutCard {
    fn from_session(session: &WorkoutSession, title: &str) -> Self {
        Self {
            date: session.date,
            title: title.to_string(),
            duration_min: session.duration_min,
            set_count: session.sets.len(),
            total_reps: session
                .sets
                .iter()
                .filter_map(|s| s.rep_count())
                .map(u64::from)
                .sum(),
        }
    }
}

/// Overview cards; each is None when the snapshot has no data for it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub bodyweight: Option<BodyweightCard>,
    /// Readings from the last `DEFAULT_WINDOW_DAYS` days, oldest first
    pub bodyweight_chart: Vec<BodyweightPoint>,
    pub body_fat: Option<BodyFatCard>,
    pub nutrition: Option<NutritionCard>,
    pub last_workout: Option<WorkoutCard>,
}

/// Build the overview as of `today`. Records dated after `today` are ignored.
pub fn build_overview(snapshot: &Snapshot, today: NaiveDate) -> Overview {
    let mut bodyweight = BodyweightSeries::new();
    for record in snapshot.body_comp.iter().filter(|r| r.date <= today) {
        if let Some(kg) = record.bodyweight_kg() {
            bodyweight.insert(record.date, kg);
        }
    }
    let bodyweight_card = bodyweight.latest().map(|(date, kg)| BodyweightCard {
        date,
        kg,
        change_kg: bodyweight.previous().map(|(_, prev)| kg - prev),
    });
    let bodyweight_chart = bodyweight_window(&bodyweight, today, DEFAULT_WINDOW_DAYS);

    let body_fat = snapshot
        .body_comp
        .iter()
        .filter(|r| r.date <= today)
        .filter_map(|r| r.fat_pct.map(|pct| (r.date, pct)))
        .max_by_key(|(date, _)| *date)
        .map(|(date, pct)| BodyFatCard { date, pct });

    let past_days = snapshot.nutrition.iter().filter(|d| d.date <= today);
    let nutrition = snapshot
        .nutrition
        .iter()
        .find(|d| d.date == today)
        .or_else(|| past_days.max_by_key(|d| d.date))
        .map(|d| NutritionCard::from_day(d, today));

    let last_workout = snapshot
        .workouts
        .iter()
        .filter(|w| w.date <= today)
        .filter_map(|w| {
            w.title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| (w, t))
        })
        .max_by_key(|(w, _)| w.date)
        .map(|(w, title)| WorkoutCard::from_session(w, title));

    Overview {
        bodyweight: bodyweight_card,
        bodyweight_chart,
        body_fat,
        nutrition,
        last_workout,
    }
}

/// Bodyweight readings from the last `days` days up to `today`
pub fn bodyweight_window(
    series: &BodyweightSeries,
    today: NaiveDate,
    days: i64,
) -> Vec<BodyweightPoint> {
    series
        .since(today - Duration::days(days))
        .into_iter()
        .filter(|(date, _)| *date <= today)
        .map(|(date, kg)| BodyweightPoint { date, kg })
        .collect()
}
