//! Read-only analytics over a user's stored sessions

use chrono::NaiveDate;
use serde::Serialize;

use super::{load_sessions, AppState};
use crate::activity::{ActivityReport, ActivityWindow};
use crate::analysis::{DashboardStats, VolumeRange, VolumeTrends};
use crate::models::{User, WorkoutSession, WorkoutType};
use crate::muscle_analyzer::{workouts_for_muscle_group, MuscleRegion, MuscleSummary};
use crate::progression::{
  personal_records, strength_progression, ExerciseProgression, PersonalRecord, ProgressionMetric,
  ProgressionSummary,
};
use crate::store::SessionRepository;
use crate::taxonomy::TargetedMuscles;

pub async fn get_dashboard_stats<R: SessionRepository>(
  state: &AppState<R>,
  user: User,
  today: NaiveDate,
) -> Result<DashboardStats, String> {
  let sessions = load_sessions(state, user).await?;
  Ok(DashboardStats::compute(&sessions, today))
}

pub async fn get_muscle_analysis<R: SessionRepository>(
  state: &AppState<R>,
  user: User,
) -> Result<MuscleSummary, String> {
  let sessions = load_sessions(state, user).await?;
  Ok(MuscleSummary::compute(&sessions))
}

/// Sessions with at least one exercise whose name matches `region`
pub async fn get_workouts_for_muscle<R: SessionRepository>(
  state: &AppState<R>,
  user: User,
  region: MuscleRegion,
) -> Result<Vec<WorkoutSession>, String> {
  let sessions = load_sessions(state, user).await?;
  Ok(workouts_for_muscle_group(&sessions, region).into_iter().cloned().collect())
}

/// Muscles a split targets, for pre-filling and display. Needs no history.
pub fn get_targeted_muscles(workout_type: WorkoutType) -> TargetedMuscles {
  TargetedMuscles::for_workout_type(workout_type)
}

pub async fn get_activity_heatmap<R: SessionRepository>(
  state: &AppState<R>,
  user: User,
  window: ActivityWindow,
  today: NaiveDate,
) -> Result<ActivityReport, String> {
  let sessions = load_sessions(state, user).await?;
  Ok(ActivityReport::compute(&sessions, window, today))
}

pub async fn get_volume_trends<R: SessionRepository>(
  state: &AppState<R>,
  user: User,
  range: VolumeRange,
  today: NaiveDate,
) -> Result<VolumeTrends, String> {
  let sessions = load_sessions(state, user).await?;
  Ok(VolumeTrends::compute(&sessions, range, today))
}

pub async fn get_personal_records<R: SessionRepository>(
  state: &AppState<R>,
  user: User,
) -> Result<Vec<PersonalRecord>, String> {
  let sessions = load_sessions(state, user).await?;
  Ok(personal_records(&sessions))
}

/// ---------------------------------------------------------------------------
/// Strength Progression
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseGrowth {
  #[serde(flatten)]
  pub progression: ExerciseProgression,
  pub weight_growth: f64,
  pub reps_growth: f64,
  pub volume_growth: f64,
  pub one_rep_max_growth: f64,
}

impl From<ExerciseProgression> for ExerciseGrowth {
  fn from(progression: ExerciseProgression) -> Self {
    Self {
      weight_growth: progression.growth(ProgressionMetric::MaxWeight),
      reps_growth: progression.growth(ProgressionMetric::MaxReps),
      volume_growth: progression.growth(ProgressionMetric::Volume),
      one_rep_max_growth: progression.growth(ProgressionMetric::OneRepMax),
      progression,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthProgressionReport {
  pub summary: ProgressionSummary,
  pub exercises: Vec<ExerciseGrowth>,
}

/// Progression for every tracked exercise, or only `exercise` (exact name,
/// case-insensitive) when given. The summary always covers all exercises.
pub async fn get_strength_progression<R: SessionRepository>(
  state: &AppState<R>,
  user: User,
  exercise: Option<&str>,
) -> Result<StrengthProgressionReport, String> {
  let sessions = load_sessions(state, user).await?;
  let progressions = strength_progression(&sessions);
  let summary = ProgressionSummary::compute(&progressions);

  let exercises = progressions
    .into_iter()
    .filter(|p| exercise.map_or(true, |name| p.exercise.eq_ignore_ascii_case(name.trim())))
    .map(ExerciseGrowth::from)
    .collect();

  Ok(StrengthProgressionReport { summary, exercises })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::assert_approx_eq;
  use crate::models::{Exercise, ExerciseSet};
  use crate::store::InMemorySessionStore;
  use crate::taxonomy::MuscleCategory;
  use crate::test_utils::{date, mock_config, mock_session, mock_session_for};

  fn state() -> AppState<InMemorySessionStore> {
    let chest = |d: &str, w: f64| {
      mock_session(
        d,
        vec![Exercise::new("Chest Press", vec![ExerciseSet::new(10, w); 3]).with_muscle_groups(["chest-upper"])],
      )
    };
    let store = InMemorySessionStore::with_sessions(vec![
      chest("2024-01-24", 100.0),
      chest("2024-01-31", 110.0),
      mock_session_for(
        User::Delchan,
        "2024-01-31",
        vec![Exercise::new("Chest Press", vec![ExerciseSet::new(10, 40.0)])],
      ),
    ]);
    AppState::new(store, mock_config("http://localhost"))
  }

  #[tokio::test]
  async fn test_dashboard_is_per_user() {
    let stats = get_dashboard_stats(&state(), User::Nav, date("2024-01-31")).await.unwrap();
    assert_eq!(stats.total_workouts, 2);
    assert_eq!(stats.total_volume, 6300.0);
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.personal_records, 1);
  }

  #[tokio::test]
  async fn test_heatmap_week_over_week_unchanged() {
    let report = get_activity_heatmap(&state(), User::Nav, ActivityWindow::Week, date("2024-01-31"))
      .await
      .unwrap();

    let chest = report.get(MuscleCategory::Chest).unwrap();
    assert_eq!(chest.current_sets, 3);
    assert_eq!(chest.previous_sets, 3);
    assert_eq!(chest.trend, 0.0);
  }

  #[tokio::test]
  async fn test_muscle_analysis_and_filter() {
    let state = state();
    let summary = get_muscle_analysis(&state, User::Nav).await.unwrap();
    let chest = summary.breakdown.iter().find(|r| r.id == MuscleRegion::Chest).unwrap();
    assert_eq!(chest.workout_count, 2);

    let matching = get_workouts_for_muscle(&state, User::Nav, MuscleRegion::Chest).await.unwrap();
    assert_eq!(matching.len(), 2);
    let none = get_workouts_for_muscle(&state, User::Nav, MuscleRegion::Calves).await.unwrap();
    assert!(none.is_empty());
  }

  #[tokio::test]
  async fn test_strength_progression_filter() {
    let state = state();
    let report = get_strength_progression(&state, User::Nav, None).await.unwrap();
    assert_eq!(report.summary.tracked_exercises, 1);
    assert_approx_eq!(report.exercises[0].weight_growth, 10.0, 1e-9);

    let filtered = get_strength_progression(&state, User::Nav, Some("chest press")).await.unwrap();
    assert_eq!(filtered.exercises.len(), 1);
    let missing = get_strength_progression(&state, User::Nav, Some("Deadlift")).await.unwrap();
    assert!(missing.exercises.is_empty());
    assert_eq!(missing.summary.tracked_exercises, 1);
  }

  #[tokio::test]
  async fn test_volume_trends_and_records() {
    let state = state();
    let trends = get_volume_trends(&state, User::Nav, VolumeRange::Month, date("2024-01-31"))
      .await
      .unwrap();
    assert_eq!(trends.days.len(), 2);

    let records = get_personal_records(&state, User::Nav).await.unwrap();
    assert_eq!(records[0].weight, 110.0);
  }
}
