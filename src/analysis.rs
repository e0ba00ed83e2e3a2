//! Deterministic summary statistics over a session history
//!
//! Everything here is a pure function of the sessions passed in and an
//! explicit `today`; nothing reads the clock.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{WorkoutSession, WorkoutType};
use crate::progression::personal_records;

/// First day of a trailing window of `days` calendar days ending today
fn window_start(today: NaiveDate, days: i64) -> NaiveDate {
  today - Duration::days(days - 1)
}

/// ---------------------------------------------------------------------------
/// Dashboard Statistics
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
  pub total_workouts: usize,
  pub total_minutes: u64,
  pub total_hours: f64,

  /// Σ reps × weight over every set
  pub total_volume: f64,

  pub avg_duration: Option<f64>,

  /// Mean over rated sessions only
  pub avg_rating: Option<f64>,
  pub rated_workouts: usize,

  pub workouts_last_7_days: usize,
  pub workouts_last_30_days: usize,
  pub workouts_this_month: usize,

  pub current_streak: u32,
  pub longest_streak: u32,

  pub favorite_workout_type: Option<WorkoutType>,
  pub workout_type_counts: BTreeMap<WorkoutType, usize>,

  pub personal_records: usize,
}

impl DashboardStats {
  pub fn compute(sessions: &[WorkoutSession], today: NaiveDate) -> Self {
    let total_workouts = sessions.len();
    let total_minutes: u64 = sessions.iter().map(|s| s.duration as u64).sum();
    let total_volume: f64 = sessions.iter().map(WorkoutSession::volume).sum();

    let avg_duration = if total_workouts > 0 {
      Some(total_minutes as f64 / total_workouts as f64)
    } else {
      None
    };

    let ratings: Vec<f64> = sessions.iter().filter_map(|s| s.rating).map(f64::from).collect();
    let avg_rating = if ratings.is_empty() {
      None
    } else {
      Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
    };

    let week_start = window_start(today, 7);
    let month_start = window_start(today, 30);

    let workouts_last_7_days = sessions.iter().filter(|s| s.date >= week_start).count();
    let workouts_last_30_days = sessions.iter().filter(|s| s.date >= month_start).count();
    let workouts_this_month = sessions
      .iter()
      .filter(|s| s.date.year() == today.year() && s.date.month() == today.month())
      .count();

    let dates: BTreeSet<NaiveDate> = sessions.iter().map(|s| s.date).collect();

    let mut workout_type_counts: BTreeMap<WorkoutType, usize> = BTreeMap::new();
    for s in sessions {
      *workout_type_counts.entry(s.workout_type).or_insert(0) += 1;
    }

    Self {
      total_workouts,
      total_minutes,
      total_hours: total_minutes as f64 / 60.0,
      total_volume,
      avg_duration,
      avg_rating,
      rated_workouts: ratings.len(),
      workouts_last_7_days,
      workouts_last_30_days,
      workouts_this_month,
      current_streak: current_streak(&dates, today),
      longest_streak: longest_streak(&dates),
      favorite_workout_type: favorite_workout_type(&workout_type_counts),
      workout_type_counts,
      personal_records: personal_records(sessions).len(),
    }
  }
}

/// Consecutive training days ending today.
///
/// The walk starts today when today has a session, otherwise yesterday: an
/// untrained today does not break the streak until the day is over. The first
/// day without a session ends it.
pub fn current_streak(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
  let mut day = if dates.contains(&today) {
    today
  } else {
    match today.pred_opt() {
      Some(d) => d,
      None => return 0,
    }
  };

  let mut streak = 0;
  while dates.contains(&day) {
    streak += 1;
    match day.pred_opt() {
      Some(d) => day = d,
      None => break,
    }
  }
  streak
}

/// Longest run of consecutive training days anywhere in the history
pub fn longest_streak(dates: &BTreeSet<NaiveDate>) -> u32 {
  let mut longest = 0;
  let mut run = 0;
  let mut prev: Option<NaiveDate> = None;

  for date in dates {
    run = match prev {
      Some(p) if p.succ_opt() == Some(*date) => run + 1,
      _ => 1,
    };
    longest = longest.max(run);
    prev = Some(*date);
  }

  longest
}

/// Most frequent split. Ties go to the split declared first in `WorkoutType`.
pub fn favorite_workout_type(counts: &BTreeMap<WorkoutType, usize>) -> Option<WorkoutType> {
  let mut best: Option<(WorkoutType, usize)> = None;
  for workout_type in WorkoutType::ALL {
    let count = counts.get(&workout_type).copied().unwrap_or(0);
    if count > 0 && best.map_or(true, |(_, c)| count > c) {
      best = Some((workout_type, count));
    }
  }
  best.map(|(t, _)| t)
}

/// ---------------------------------------------------------------------------
/// Volume Trends
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeRange {
  Week,
  Month,
  #[default]
  ThreeMonths,
  SixMonths,
  Year,
}

impl VolumeRange {
  /// Earliest date included. Month-based ranges step back calendar months and
  /// exclude the day they land on, so "month" ending 03-31 starts 03-01.
  pub fn cutoff(&self, today: NaiveDate) -> NaiveDate {
    let months = match self {
      VolumeRange::Week => return window_start(today, 7),
      VolumeRange::Month => 1,
      VolumeRange::ThreeMonths => 3,
      VolumeRange::SixMonths => 6,
      VolumeRange::Year => 12,
    };
    today
      .checked_sub_months(Months::new(months))
      .and_then(|d| d.succ_opt())
      .unwrap_or(NaiveDate::MIN)
  }
}

impl std::str::FromStr for VolumeRange {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "week" => Ok(VolumeRange::Week),
      "month" => Ok(VolumeRange::Month),
      "3months" | "three_months" => Ok(VolumeRange::ThreeMonths),
      "6months" | "six_months" => Ok(VolumeRange::SixMonths),
      "year" => Ok(VolumeRange::Year),
      _ => Err(format!("Unknown volume range: {}", s)),
    }
  }
}

/// Training load for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyVolume {
  pub date: NaiveDate,
  pub total_volume: f64,
  pub volume_by_type: BTreeMap<WorkoutType, f64>,
  pub exercise_count: usize,
  pub set_count: usize,
}

impl DailyVolume {
  fn new(date: NaiveDate) -> Self {
    Self {
      date,
      total_volume: 0.0,
      volume_by_type: WorkoutType::ALL.iter().map(|t| (*t, 0.0)).collect(),
      exercise_count: 0,
      set_count: 0,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeTrends {
  pub range: VolumeRange,
  /// Ascending by date
  pub days: Vec<DailyVolume>,
  pub total_volume: f64,
  pub average_volume: f64,
  pub max_volume: f64,
  /// Mean of the latest 30% of days against the earliest 30%
  pub trend_pct: f64,
  pub volume_by_type: BTreeMap<WorkoutType, f64>,
}

impl VolumeTrends {
  pub fn compute(sessions: &[WorkoutSession], range: VolumeRange, today: NaiveDate) -> Self {
    let cutoff = range.cutoff(today);

    let mut by_date: BTreeMap<NaiveDate, DailyVolume> = BTreeMap::new();
    for session in sessions.iter().filter(|s| s.date >= cutoff) {
      let entry = by_date
        .entry(session.date)
        .or_insert_with(|| DailyVolume::new(session.date));
      let volume = session.volume();
      entry.total_volume += volume;
      *entry.volume_by_type.entry(session.workout_type).or_insert(0.0) += volume;
      entry.exercise_count += session.exercises.len();
      entry.set_count += session.set_count();
    }

    let days: Vec<DailyVolume> = by_date.into_values().collect();

    let total_volume: f64 = days.iter().map(|d| d.total_volume).sum();
    let average_volume = if days.is_empty() {
      0.0
    } else {
      total_volume / days.len() as f64
    };
    let max_volume = days.iter().map(|d| d.total_volume).fold(0.0, f64::max);

    let mut volume_by_type: BTreeMap<WorkoutType, f64> =
      WorkoutType::ALL.iter().map(|t| (*t, 0.0)).collect();
    for day in &days {
      for (t, v) in &day.volume_by_type {
        *volume_by_type.entry(*t).or_insert(0.0) += v;
      }
    }

    Self {
      range,
      trend_pct: volume_trend_pct(&days),
      days,
      total_volume,
      average_volume,
      max_volume,
      volume_by_type,
    }
  }
}

fn volume_trend_pct(days: &[DailyVolume]) -> f64 {
  if days.is_empty() {
    return 0.0;
  }

  let span = ((days.len() as f64 * 0.3).floor() as usize).max(1);
  let mean = |slice: &[DailyVolume]| -> f64 {
    slice.iter().map(|d| d.total_volume).sum::<f64>() / slice.len() as f64
  };

  let earliest = mean(&days[..span]);
  let recent = mean(&days[days.len() - span..]);

  if earliest > 0.0 {
    (recent - earliest) / earliest * 100.0
  } else {
    0.0
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
