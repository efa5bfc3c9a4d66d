//! Bodyweight time series
//!
//! Sparse date → kg lookups used to resolve the effective load of assisted and
//! bodyweight-relative lifts.

use crate::snapshot::{BodyCompRecord, Snapshot};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bodyweight readings keyed by date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyweightSeries {
    readings: BTreeMap<NaiveDate, f64>,
    /// Undated value (e.g. the snapshot summary) used only when there are no
    /// dated readings at all
    fallback_kg: Option<f64>,
}

impl BodyweightSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from body composition records; a later record on the same date
    /// replaces an earlier one
    pub fn from_records(records: &[BodyCompRecord]) -> Self {
        let mut series = Self::new();
        for record in records {
            if let Some(kg) = record.bodyweight_kg() {
                series.insert(record.date, kg);
            }
        }
        series
    }

    /// Build from a snapshot's body composition, with the summary trend as the
    /// undated fallback
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut series = Self::from_records(&snapshot.body_comp);
        series.fallback_kg = snapshot
            .summary
            .trend_kg
            .filter(|kg| kg.is_finite() && *kg > 0.0);
        series
    }

    pub fn insert(&mut self, date: NaiveDate, kg: f64) {
        self.readings.insert(date, kg);
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Bodyweight on `date`: the reading on or before it, else the latest
    /// known reading, else the undated fallback
    pub fn resolve(&self, date: NaiveDate) -> Option<f64> {
        self.readings
            .range(..=date)
            .next_back()
            .map(|(_, kg)| *kg)
            .or_else(|| self.latest().map(|(_, kg)| kg))
            .or(self.fallback_kg)
    }

    /// Resolve, substituting `default_kg` when nothing is known
    pub fn resolve_or(&self, date: NaiveDate, default_kg: f64) -> f64 {
        self.resolve(date).unwrap_or(default_kg)
    }

    /// Most recent dated reading
    pub fn latest(&self) -> Option<(NaiveDate, f64)> {
        self.readings.iter().next_back().map(|(d, kg)| (*d, *kg))
    }

    /// Reading before the most recent one
    pub fn previous(&self) -> Option<(NaiveDate, f64)> {
        self.readings.iter().rev().nth(1).map(|(d, kg)| (*d, *kg))
    }

    /// Readings on or after `since`, in date order
    pub fn since(&self, since: NaiveDate) -> Vec<(NaiveDate, f64)> {
        self.readings.range(since..).map(|(d, kg)| (*d, *kg)).collect()
    }
}
