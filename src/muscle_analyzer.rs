//! Name-based muscle activity analysis
//!
//! Infers which muscle regions an exercise trains by naive, case-insensitive
//! substring matching of the exercise name against a keyword table. This is a
//! separate (coarser) taxonomy from `taxonomy::MuscleGroup`; the two are not
//! interchangeable.
//!
//! Matching is deliberately literal: "Bench Press" contains none of the chest
//! keywords and therefore trains nothing as far as this module is concerned,
//! while "Close-Grip Tricep Chest Press" counts for both chest and triceps.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Exercise, WorkoutSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuscleRegion {
  Chest,
  Back,
  Shoulders,
  Biceps,
  Triceps,
  Forearms,
  Abs,
  Quadriceps,
  Hamstrings,
  Glutes,
  Calves,
  Neck,
}

/// Keyword table, in output order
pub const MUSCLE_KEYWORDS: [(MuscleRegion, &[&str]); 12] = [
  (MuscleRegion::Chest, &["chest", "pectorals", "pecs"]),
  (
    MuscleRegion::Back,
    &["back", "lats", "latissimus", "rhomboids", "traps", "trapezius"],
  ),
  (MuscleRegion::Shoulders, &["shoulders", "delts", "deltoids"]),
  (MuscleRegion::Biceps, &["biceps", "bicep"]),
  (MuscleRegion::Triceps, &["triceps", "tricep"]),
  (MuscleRegion::Forearms, &["forearms", "forearm"]),
  (MuscleRegion::Abs, &["abs", "core", "abdominals"]),
  (MuscleRegion::Quadriceps, &["quadriceps", "quads", "quad"]),
  (MuscleRegion::Hamstrings, &["hamstrings", "hamstring"]),
  (MuscleRegion::Glutes, &["glutes", "glute", "buttocks"]),
  (MuscleRegion::Calves, &["calves", "calf"]),
  (MuscleRegion::Neck, &["neck"]),
];

impl MuscleRegion {
  pub fn id(&self) -> &'static str {
    match self {
      MuscleRegion::Chest => "chest",
      MuscleRegion::Back => "back",
      MuscleRegion::Shoulders => "shoulders",
      MuscleRegion::Biceps => "biceps",
      MuscleRegion::Triceps => "triceps",
      MuscleRegion::Forearms => "forearms",
      MuscleRegion::Abs => "abs",
      MuscleRegion::Quadriceps => "quadriceps",
      MuscleRegion::Hamstrings => "hamstrings",
      MuscleRegion::Glutes => "glutes",
      MuscleRegion::Calves => "calves",
      MuscleRegion::Neck => "neck",
    }
  }

  /// Display name: the id with its first letter capitalized
  pub fn display_name(&self) -> String {
    let id = self.id();
    let mut chars = id.chars();
    match chars.next() {
      Some(first) => first.to_uppercase().chain(chars).collect(),
      None => String::new(),
    }
  }

  pub fn keywords(&self) -> &'static [&'static str] {
    MUSCLE_KEYWORDS
      .iter()
      .find(|(region, _)| region == self)
      .map(|(_, keywords)| *keywords)
      .unwrap_or(&[])
  }

  /// Whether an exercise name contains any of this region's keywords
  pub fn matches_name(&self, exercise_name: &str) -> bool {
    let name = exercise_name.to_lowercase();
    self
      .keywords()
      .iter()
      .any(|keyword| name.contains(&keyword.to_lowercase()))
  }
}

impl std::str::FromStr for MuscleRegion {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let needle = s.trim().to_lowercase();
    MUSCLE_KEYWORDS
      .iter()
      .map(|(region, _)| *region)
      .find(|region| region.id() == needle)
      .ok_or_else(|| format!("Unknown muscle region: {}", s))
  }
}

/// Per-region aggregate over a session history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuscleGroupRecord {
  pub id: MuscleRegion,
  pub name: String,
  /// Matching exercise occurrences (not sets)
  pub workout_count: u32,
  pub total_volume: f64,
  pub exercises: Vec<String>,
  pub last_worked: Option<NaiveDate>,
}

impl MuscleGroupRecord {
  fn empty(region: MuscleRegion) -> Self {
    Self {
      id: region,
      name: region.display_name(),
      workout_count: 0,
      total_volume: 0.0,
      exercises: Vec::new(),
      last_worked: None,
    }
  }

  pub fn is_trained(&self) -> bool {
    self.workout_count > 0
  }

  fn record_match(&mut self, exercise: &Exercise, date: NaiveDate) {
    self.workout_count += 1;
    self.total_volume += exercise.volume();
    if self.last_worked.map_or(true, |last| date > last) {
      self.last_worked = Some(date);
    }
    if !self.exercises.iter().any(|name| name == &exercise.name) {
      self.exercises.push(exercise.name.clone());
    }
  }
}

/// Aggregate every session into one record per region.
///
/// All twelve regions are returned, untrained ones with zero counts, in
/// keyword-table order.
pub fn analyze_muscle_groups(sessions: &[WorkoutSession]) -> Vec<MuscleGroupRecord> {
  let mut records: Vec<MuscleGroupRecord> = MUSCLE_KEYWORDS
    .iter()
    .map(|(region, _)| MuscleGroupRecord::empty(*region))
    .collect();

  for session in sessions {
    for exercise in &session.exercises {
      for record in records.iter_mut() {
        if record.id.matches_name(&exercise.name) {
          record.record_match(exercise, session.date);
        }
      }
    }
  }

  records
}

/// Sessions containing at least one exercise whose name matches the region
pub fn workouts_for_muscle_group(
  sessions: &[WorkoutSession],
  region: MuscleRegion,
) -> Vec<&WorkoutSession> {
  sessions
    .iter()
    .filter(|s| s.exercises.iter().any(|e| region.matches_name(&e.name)))
    .collect()
}

/// Headline numbers shown next to the body diagram
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuscleSummary {
  pub total_workouts: usize,
  pub total_volume: f64,
  pub active_muscles: usize,
  /// Trained regions, most frequently trained first
  pub breakdown: Vec<MuscleGroupRecord>,
  pub untargeted: Vec<MuscleRegion>,
}

impl MuscleSummary {
  pub fn compute(sessions: &[WorkoutSession]) -> Self {
    let records = analyze_muscle_groups(sessions);

    let mut breakdown: Vec<MuscleGroupRecord> =
      records.iter().filter(|r| r.is_trained()).cloned().collect();
    breakdown.sort_by(|a, b| b.workout_count.cmp(&a.workout_count));

    Self {
      total_workouts: sessions.len(),
      total_volume: records.iter().map(|r| r.total_volume).sum(),
      active_muscles: breakdown.len(),
      breakdown,
      untargeted: records
        .iter()
        .filter(|r| !r.is_trained())
        .map(|r| r.id)
        .collect(),
    }
  }
}
