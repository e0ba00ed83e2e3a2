//! Windowed muscle-category activity (heat map data)
//!
//! Counts sets per coarse body category over a trailing window, using the
//! muscle tags explicitly attached to each exercise (not name inference), then
//! compares the window with the equal-length window just before it.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::WorkoutSession;
use crate::taxonomy::{category_of_muscle_group, MuscleCategory};

const RANKED_CATEGORIES: usize = 3;

/// ---------------------------------------------------------------------------
/// Lookback windows
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityWindow {
  Week,
  #[default]
  Month,
  Quarter,
  All,
}

impl ActivityWindow {
  pub fn days(&self) -> i64 {
    match self {
      ActivityWindow::Week => 7,
      ActivityWindow::Month => 30,
      ActivityWindow::Quarter => 90,
      ActivityWindow::All => 365,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      ActivityWindow::Week => "Last 7 days",
      ActivityWindow::Month => "Last 30 days",
      ActivityWindow::Quarter => "Last 90 days",
      ActivityWindow::All => "Last year",
    }
  }
}

impl std::str::FromStr for ActivityWindow {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "week" => Ok(ActivityWindow::Week),
      "month" => Ok(ActivityWindow::Month),
      "quarter" => Ok(ActivityWindow::Quarter),
      "all" | "year" => Ok(ActivityWindow::All),
      _ => Err(format!("Unknown activity window: {}", s)),
    }
  }
}

/// Day-granular bounds for a window ending `today`.
///
/// Current covers `[current_start, ∞)`, i.e. the last N calendar days
/// including today (and anything dated in the future). Previous covers
/// `[previous_start, current_start)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
  pub current_start: NaiveDate,
  pub previous_start: NaiveDate,
}

impl WindowBounds {
  pub fn new(window: ActivityWindow, today: NaiveDate) -> Self {
    let days = window.days();
    Self {
      current_start: today - Duration::days(days - 1),
      previous_start: today - Duration::days(2 * days - 1),
    }
  }

  pub fn in_current(&self, date: NaiveDate) -> bool {
    date >= self.current_start
  }

  pub fn in_previous(&self, date: NaiveDate) -> bool {
    date >= self.previous_start && date < self.current_start
  }
}

/// ---------------------------------------------------------------------------
/// Heat bands
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatBand {
  Unused,
  Light,
  Moderate,
  High,
  Peak,
}

impl HeatBand {
  pub fn from_intensity(intensity: f64) -> Self {
    match intensity {
      i if i <= 0.0 => HeatBand::Unused,
      i if i < 0.3 => HeatBand::Light,
      i if i < 0.6 => HeatBand::Moderate,
      i if i < 0.8 => HeatBand::High,
      _ => HeatBand::Peak,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Report
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryActivity {
  pub category: MuscleCategory,
  /// Sets in the current window
  pub current_sets: u32,
  pub previous_sets: u32,
  /// Sets divided by the busiest category's sets, in [0, 1]
  pub current_intensity: f64,
  pub previous_intensity: f64,
  /// current_intensity - previous_intensity
  pub trend: f64,
  pub trend_pct: f64,
  pub band: HeatBand,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityReport {
  pub window: ActivityWindow,
  /// Human-readable window, e.g. "Last 7 days"
  pub label: String,
  pub bounds: WindowBounds,
  /// One entry per category, in category order
  pub categories: Vec<CategoryActivity>,
  pub most_worked: Vec<CategoryActivity>,
  pub least_worked: Vec<CategoryActivity>,
  /// Tags that resolved to no category and were skipped
  pub unrecognized_tags: Vec<String>,
}

impl ActivityReport {
  pub fn compute(sessions: &[WorkoutSession], window: ActivityWindow, today: NaiveDate) -> Self {
    let bounds = WindowBounds::new(window, today);
    let mut unrecognized = BTreeSet::new();

    let current_counts = tally_sets(
      sessions.iter().filter(|s| bounds.in_current(s.date)),
      &mut unrecognized,
    );
    let previous_counts = tally_sets(
      sessions.iter().filter(|s| bounds.in_previous(s.date)),
      &mut unrecognized,
    );

    let current = normalize(&current_counts);
    let previous = normalize(&previous_counts);

    let categories: Vec<CategoryActivity> = MuscleCategory::ALL
      .iter()
      .map(|category| {
        let current_intensity = current.get(category).copied().unwrap_or(0.0);
        let previous_intensity = previous.get(category).copied().unwrap_or(0.0);
        CategoryActivity {
          category: *category,
          current_sets: current_counts.get(category).copied().unwrap_or(0),
          previous_sets: previous_counts.get(category).copied().unwrap_or(0),
          current_intensity,
          previous_intensity,
          trend: current_intensity - previous_intensity,
          trend_pct: trend_percent(current_intensity, previous_intensity),
          band: HeatBand::from_intensity(current_intensity),
        }
      })
      .collect();

    // Stable sort: equal intensities keep category order
    let mut ranked = categories.clone();
    ranked.sort_by(|a, b| b.current_intensity.total_cmp(&a.current_intensity));

    let most_worked = ranked.iter().take(RANKED_CATEGORIES).cloned().collect();
    let least_worked = ranked.iter().rev().take(RANKED_CATEGORIES).cloned().collect();

    if !unrecognized.is_empty() {
      debug!(tags = ?unrecognized, "Skipped unrecognized muscle tags");
    }

    Self {
      window,
      label: window.label().to_string(),
      bounds,
      categories,
      most_worked,
      least_worked,
      unrecognized_tags: unrecognized.into_iter().collect(),
    }
  }

  pub fn get(&self, category: MuscleCategory) -> Option<&CategoryActivity> {
    self.categories.iter().find(|c| c.category == category)
  }
}

/// Sets per category, one contribution per explicit tag
fn tally_sets<'a>(
  sessions: impl Iterator<Item = &'a WorkoutSession>,
  unrecognized: &mut BTreeSet<String>,
) -> BTreeMap<MuscleCategory, u32> {
  let mut counts: BTreeMap<MuscleCategory, u32> =
    MuscleCategory::ALL.iter().map(|c| (*c, 0)).collect();

  for session in sessions {
    for exercise in &session.exercises {
      let sets = exercise.sets.len() as u32;
      for tag in &exercise.muscle_groups {
        match category_of_muscle_group(tag) {
          Ok(category) => *counts.entry(category).or_insert(0) += sets,
          Err(_) => {
            unrecognized.insert(tag.clone());
          }
        }
      }
    }
  }

  counts
}

/// Max-normalize to [0, 1]. An all-zero partition stays all zero.
fn normalize(counts: &BTreeMap<MuscleCategory, u32>) -> BTreeMap<MuscleCategory, f64> {
  let max = counts.values().copied().max().unwrap_or(0);
  counts
    .iter()
    .map(|(category, count)| {
      let value = if max > 0 {
        *count as f64 / max as f64
      } else {
        0.0
      };
      (*category, value)
    })
    .collect()
}

/// Relative change in percent. With no previous activity any current
/// activity counts as +100%.
pub fn trend_percent(current: f64, previous: f64) -> f64 {
  if previous > 0.0 {
    (current - previous) / previous * 100.0
  } else if current > 0.0 {
    100.0
  } else {
    0.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::assert_approx_eq;
  use crate::models::{Exercise, ExerciseSet};
  use crate::test_utils::{date, mock_session};

  fn tagged(name: &str, tags: &[&str], sets: usize) -> Exercise {
    Exercise::new(name, vec![ExerciseSet::new(10, 50.0); sets]).with_muscle_groups(tags.iter().copied())
  }

  #[test]
  fn test_window_bounds_are_day_granular() {
    let today = date("2024-01-15");
    let bounds = WindowBounds::new(ActivityWindow::Week, today);
    assert_eq!(bounds.current_start, date("2024-01-09"));
    assert_eq!(bounds.previous_start, date("2024-01-02"));

    assert!(bounds.in_current(today));
    assert!(bounds.in_current(date("2024-01-09")));
    assert!(!bounds.in_current(date("2024-01-08")));
    assert!(bounds.in_previous(date("2024-01-08")));
    assert!(bounds.in_previous(date("2024-01-02")));
    assert!(!bounds.in_previous(date("2024-01-01")));
    assert!(!bounds.in_previous(date("2024-01-09")));
  }

  #[test]
  fn test_same_work_one_week_apart_has_no_trend() {
    let today = date("2024-01-15");
    let sessions = vec![
      mock_session("2024-01-08", vec![tagged("Incline Press", &["chest-upper"], 3)]),
      mock_session("2024-01-15", vec![tagged("Incline Press", &["chest-upper"], 3)]),
    ];

    let report = ActivityReport::compute(&sessions, ActivityWindow::Week, today);
    let chest = report.get(MuscleCategory::Chest).unwrap();
    assert_eq!(chest.current_sets, 3);
    assert_eq!(chest.previous_sets, 3);
    assert_eq!(chest.current_intensity, 1.0);
    assert_eq!(chest.trend, 0.0);
    assert_eq!(chest.trend_pct, 0.0);
    assert_eq!(chest.band, HeatBand::Peak);
    assert_eq!(report.label, "Last 7 days");
  }

  #[test]
  fn test_counts_sets_per_tag_and_normalizes_by_max() {
    let today = date("2024-06-30");
    let sessions = vec![mock_session(
      "2024-06-29",
      vec![
        tagged("Bench", &["chest-middle", "triceps-long", "delts-anterior"], 4),
        tagged("Curl", &["biceps-long", "biceps-short"], 3),
        tagged("Squat", &["quads-rectus-femoris"], 2),
      ],
    )];

    let report = ActivityReport::compute(&sessions, ActivityWindow::Month, today);
    // arms: 4 (triceps) + 3 + 3 (two biceps tags) = 10
    let arms = report.get(MuscleCategory::Arms).unwrap();
    assert_eq!(arms.current_sets, 10);
    assert_eq!(arms.current_intensity, 1.0);

    assert_approx_eq!(report.get(MuscleCategory::Chest).unwrap().current_intensity, 0.4, 1e-9);
    assert_approx_eq!(report.get(MuscleCategory::Legs).unwrap().current_intensity, 0.2, 1e-9);
    assert_eq!(report.get(MuscleCategory::Back).unwrap().current_intensity, 0.0);
    assert_eq!(report.get(MuscleCategory::Back).unwrap().band, HeatBand::Unused);
    assert_eq!(report.get(MuscleCategory::Legs).unwrap().band, HeatBand::Light);

    for c in &report.categories {
      assert!((0.0..=1.0).contains(&c.current_intensity));
    }
  }

  #[test]
  fn test_empty_partitions_are_zero_not_nan() {
    let report = ActivityReport::compute(&[], ActivityWindow::Quarter, date("2024-01-01"));
    for c in &report.categories {
      assert_eq!(c.current_intensity, 0.0);
      assert_eq!(c.previous_intensity, 0.0);
      assert_eq!(c.trend_pct, 0.0);
      assert!(!c.trend.is_nan());
    }
  }

  #[test]
  fn test_name_inference_is_not_used() {
    // No explicit tags, so nothing is counted even though the name says chest
    let sessions = vec![mock_session("2024-01-10", vec![tagged("Chest Press", &[], 5)])];
    let report = ActivityReport::compute(&sessions, ActivityWindow::Week, date("2024-01-10"));
    assert!(report.categories.iter().all(|c| c.current_sets == 0));
  }

  #[test]
  fn test_unknown_tags_are_skipped_and_reported() {
    let sessions = vec![mock_session(
      "2024-01-10",
      vec![tagged("Neck Flexion", &["neck", "core"], 2)],
    )];

    let report = ActivityReport::compute(&sessions, ActivityWindow::Week, date("2024-01-10"));
    assert_eq!(report.unrecognized_tags, vec!["neck".to_string()]);
    assert_eq!(report.get(MuscleCategory::Core).unwrap().current_sets, 2);
    // Not silently counted as arms
    assert_eq!(report.get(MuscleCategory::Arms).unwrap().current_sets, 0);
  }

  #[test]
  fn test_trend_against_previous_window() {
    let today = date("2024-03-31");
    let sessions = vec![
      // previous window: back heavy, legs light
      mock_session("2024-03-20", vec![tagged("Row", &["lats"], 4), tagged("Lunge", &["glutes-maximus"], 2)]),
      // current window: legs heavy
      mock_session("2024-03-30", vec![tagged("Row", &["lats"], 2), tagged("Lunge", &["glutes-maximus"], 4)]),
    ];

    let report = ActivityReport::compute(&sessions, ActivityWindow::Week, today);
    let legs = report.get(MuscleCategory::Legs).unwrap();
    assert_approx_eq!(legs.previous_intensity, 0.5, 1e-9);
    assert_approx_eq!(legs.current_intensity, 1.0, 1e-9);
    assert_approx_eq!(legs.trend, 0.5, 1e-9);
    assert_approx_eq!(legs.trend_pct, 100.0, 1e-9);

    let back = report.get(MuscleCategory::Back).unwrap();
    assert_approx_eq!(back.trend, -0.5, 1e-9);
    assert_approx_eq!(back.trend_pct, -50.0, 1e-9);

    assert_eq!(report.most_worked[0].category, MuscleCategory::Legs);
    assert_eq!(report.most_worked[1].category, MuscleCategory::Back);
    assert_eq!(report.most_worked.len(), 3);
    assert_eq!(report.least_worked.len(), 3);
    // Least worked is reversed rank order: core was declared last among zeros
    assert_eq!(report.least_worked[0].category, MuscleCategory::Core);
  }

  #[test]
  fn test_trend_percent_guards() {
    assert_eq!(trend_percent(0.5, 0.0), 100.0);
    assert_eq!(trend_percent(0.0, 0.0), 0.0);
    assert_approx_eq!(trend_percent(0.25, 0.5), -50.0, 1e-9);
  }

  #[test]
  fn test_window_parsing() {
    assert_eq!("Quarter".parse::<ActivityWindow>(), Ok(ActivityWindow::Quarter));
    assert_eq!("year".parse::<ActivityWindow>(), Ok(ActivityWindow::All));
    assert_eq!(ActivityWindow::All.days(), 365);
    assert!("fortnight".parse::<ActivityWindow>().is_err());
  }
}
