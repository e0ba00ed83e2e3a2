//! Strength progression
//!
//! One-rep-max estimation, growth rates and per-exercise progression series
//! derived from a session history. Exercises are joined by exact name.
//!
//! Key rules:
//! - Sessions arrive in insertion order; every series here is sorted by date
//! - Formulas never produce NaN or infinity: invalid input is an error or 0
//! - Several sessions on one date collapse into a single point

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Exercise, User, WorkoutSession};

/// Reps at which the Brzycki denominator reaches zero
const BRZYCKI_LIMIT: u32 = 37;

#[derive(Debug, Error, PartialEq)]
pub enum ProgressionError {
    #[error("Reps must be at least 1")]
    ZeroReps,

    #[error("Cannot estimate one-rep max from {0} reps (must be below 37)")]
    TooManyReps(u32),

    #[error("Invalid weight: {0}")]
    InvalidWeight(f64),
}

// ---------------------------------------------------------------------------
/// Formulas
// ---------------------------------------------------------------------------

/// Brzycki estimate: `weight × 36 / (37 − reps)`, or the weight itself for a
/// single rep.
pub fn one_rep_max(weight: f64, reps: u32) -> Result<f64, ProgressionError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(ProgressionError::InvalidWeight(weight));
    }
    match reps {
        0 => Err(ProgressionError::ZeroReps),
        1 => Ok(weight),
        r if r >= BRZYCKI_LIMIT => Err(ProgressionError::TooManyReps(r)),
        r => Ok(weight * 36.0 / (BRZYCKI_LIMIT - r) as f64),
    }
}

/// Percent change from the first to the last value.
///
/// Returns 0 with fewer than two values or a first value that is not
/// positive.
pub fn growth_rate(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let first = values[0];
    let last = values[values.len() - 1];
    if first > 0.0 && last.is_finite() {
        (last - first) / first * 100.0
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
/// Progression Series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionMetric {
    MaxWeight,
    MaxReps,
    Volume,
    OneRepMax,
}

impl ProgressionMetric {
    pub const ALL: [ProgressionMetric; 4] = [
        ProgressionMetric::MaxWeight,
        ProgressionMetric::MaxReps,
        ProgressionMetric::Volume,
        ProgressionMetric::OneRepMax,
    ];
}

impl std::str::FromStr for ProgressionMetric {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max_weight" | "weight" => Ok(Self::MaxWeight),
            "max_reps" | "reps" => Ok(Self::MaxReps),
            "volume" => Ok(Self::Volume),
            "one_rep_max" | "1rm" => Ok(Self::OneRepMax),
            _ => Err(format!("Unknown progression metric: {}", s)),
        }
    }
}

/// Best performance on one exercise on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionPoint {
    pub date: NaiveDate,
    pub max_weight: f64,
    pub max_reps: u32,
    pub volume: f64,
    pub one_rep_max: f64,
}

impl ProgressionPoint {
    fn from_exercise(date: NaiveDate, exercise: &Exercise) -> Self {
        let max_weight = exercise
            .sets
            .iter()
            .map(|s| s.weight)
            .filter(|w| w.is_finite())
            .fold(0.0, f64::max);
        let max_reps = exercise.sets.iter().map(|s| s.reps).max().unwrap_or(0);

        let mut best_1rm = 0.0_f64;
        for set in &exercise.sets {
            match one_rep_max(set.weight, set.reps) {
                Ok(estimate) => best_1rm = best_1rm.max(estimate),
                Err(e) => tracing::debug!(exercise = %exercise.name, "Skipping set for 1RM: {}", e),
            }
        }

        Self {
            date,
            max_weight,
            max_reps,
            volume: exercise.volume(),
            one_rep_max: best_1rm,
        }
    }

    fn merge(&mut self, other: &ProgressionPoint) {
        self.max_weight = self.max_weight.max(other.max_weight);
        self.max_reps = self.max_reps.max(other.max_reps);
        self.volume += other.volume;
        self.one_rep_max = self.one_rep_max.max(other.one_rep_max);
    }

    pub fn value(&self, metric: ProgressionMetric) -> f64 {
        match metric {
            ProgressionMetric::MaxWeight => self.max_weight,
            ProgressionMetric::MaxReps => self.max_reps as f64,
            ProgressionMetric::Volume => self.volume,
            ProgressionMetric::OneRepMax => self.one_rep_max,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseProgression {
    pub exercise: String,
    /// Ascending by date, one point per date
    pub points: Vec<ProgressionPoint>,
}

impl ExerciseProgression {
    pub fn series(&self, metric: ProgressionMetric) -> Vec<f64> {
        self.points.iter().map(|p| p.value(metric)).collect()
    }

    pub fn growth(&self, metric: ProgressionMetric) -> f64 {
        growth_rate(&self.series(metric))
    }

    pub fn latest(&self) -> Option<&ProgressionPoint> {
        self.points.last()
    }
}

/// Per-exercise series for every exercise performed on at least two dates.
/// Exercises keep the order in which they were first seen.
pub fn strength_progression(sessions: &[WorkoutSession]) -> Vec<ExerciseProgression> {
    let mut order: Vec<String> = Vec::new();
    let mut by_exercise: HashMap<String, Vec<ProgressionPoint>> = HashMap::new();

    for session in sessions {
        for exercise in &session.exercises {
            let point = ProgressionPoint::from_exercise(session.date, exercise);
            let points = by_exercise.entry(exercise.name.clone()).or_insert_with(|| {
                order.push(exercise.name.clone());
                Vec::new()
            });
            match points.iter_mut().find(|p| p.date == session.date) {
                Some(existing) => existing.merge(&point),
                None => points.push(point),
            }
        }
    }

    order
        .into_iter()
        .filter_map(|name| {
            let mut points = by_exercise.remove(&name)?;
            if points.len() < 2 {
                return None;
            }
            points.sort_by_key(|p| p.date);
            Some(ExerciseProgression { exercise: name, points })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionSummary {
    pub tracked_exercises: usize,
    /// Highest 1RM growth across tracked exercises, percent
    pub best_improvement: Option<f64>,
    pub best_improvement_exercise: Option<String>,
    pub total_points: usize,
}

impl ProgressionSummary {
    pub fn compute(progressions: &[ExerciseProgression]) -> Self {
        let best = progressions
            .iter()
            .map(|p| (p, p.growth(ProgressionMetric::OneRepMax)))
            .fold(None::<(&ExerciseProgression, f64)>, |best, (p, g)| match best {
                Some((_, bg)) if bg >= g => best,
                _ => Some((p, g)),
            });

        Self {
            tracked_exercises: progressions.len(),
            best_improvement: best.map(|(_, g)| g),
            best_improvement_exercise: best.map(|(p, _)| p.exercise.clone()),
            total_points: progressions.iter().map(|p| p.points.len()).sum(),
        }
    }
}

// ---------------------------------------------------------------------------
/// Personal Records
// ---------------------------------------------------------------------------

/// Heaviest set ever logged for an exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalRecord {
    pub exercise_name: String,
    pub weight: f64,
    pub reps: u32,
    pub date: NaiveDate,
    pub user: User,
}

/// Best set per (user, exercise name): highest weight, ties broken by reps.
/// An equal set logged later does not replace the earlier record.
pub fn personal_records(sessions: &[WorkoutSession]) -> Vec<PersonalRecord> {
    let mut chronological: Vec<&WorkoutSession> = sessions.iter().collect();
    chronological.sort_by_key(|s| s.date);

    let mut records: Vec<PersonalRecord> = Vec::new();
    for session in chronological {
        for exercise in &session.exercises {
            for set in exercise.sets.iter().filter(|s| s.weight.is_finite()) {
                let existing = records
                    .iter_mut()
                    .find(|r| r.user == session.user && r.exercise_name == exercise.name);
                match existing {
                    Some(record) => {
                        let better = set.weight > record.weight
                            || (set.weight == record.weight && set.reps > record.reps);
                        if better {
                            record.weight = set.weight;
                            record.reps = set.reps;
                            record.date = session.date;
                        }
                    }
                    None => records.push(PersonalRecord {
                        exercise_name: exercise.name.clone(),
                        weight: set.weight,
                        reps: set.reps,
                        date: session.date,
                        user: session.user,
                    }),
                }
            }
        }
    }
    records
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
