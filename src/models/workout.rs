use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The two people who share this log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum User {
  Nav,
  Delchan,
}

impl User {
  pub const ALL: [User; 2] = [User::Nav, User::Delchan];

  pub fn as_str(&self) -> &'static str {
    match self {
      User::Nav => "Nav",
      User::Delchan => "Delchan",
    }
  }
}

impl std::fmt::Display for User {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for User {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "nav" => Ok(User::Nav),
      "delchan" => Ok(User::Delchan),
      _ => Err(format!("Unknown user: {}", s)),
    }
  }
}

/// Session split. Declaration order is also the tie-break order for
/// "favorite workout type".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
  Arms,
  Push,
  Pull,
  Legs,
}

impl WorkoutType {
  pub const ALL: [WorkoutType; 4] = [
    WorkoutType::Arms,
    WorkoutType::Push,
    WorkoutType::Pull,
    WorkoutType::Legs,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      WorkoutType::Arms => "arms",
      WorkoutType::Push => "push",
      WorkoutType::Pull => "pull",
      WorkoutType::Legs => "legs",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      WorkoutType::Arms => "Arms Day",
      WorkoutType::Push => "Push Day",
      WorkoutType::Pull => "Pull Day",
      WorkoutType::Legs => "Legs Day",
    }
  }
}

impl std::fmt::Display for WorkoutType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for WorkoutType {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "arms" => Ok(WorkoutType::Arms),
      "push" => Ok(WorkoutType::Push),
      "pull" => Ok(WorkoutType::Pull),
      "legs" => Ok(WorkoutType::Legs),
      _ => Err(format!("Unknown workout type: {}", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseCategory {
  Compound,
  Isolation,
  Accessory,
}

impl std::str::FromStr for ExerciseCategory {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "compound" => Ok(ExerciseCategory::Compound),
      "isolation" => Ok(ExerciseCategory::Isolation),
      "accessory" => Ok(ExerciseCategory::Accessory),
      _ => Err(format!("Unknown exercise category: {}", s)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSet {
  pub reps: u32,
  /// 0 = bodyweight
  pub weight: f64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rpe: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  /// Rest after the set, in seconds
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rest_time: Option<u32>,
}

impl ExerciseSet {
  pub fn new(reps: u32, weight: f64) -> Self {
    Self {
      reps,
      weight,
      rpe: None,
      notes: None,
      rest_time: None,
    }
  }

  /// reps × weight. A negative or non-finite weight contributes nothing.
  pub fn volume(&self) -> f64 {
    if self.weight.is_finite() && self.weight > 0.0 {
      self.reps as f64 * self.weight
    } else {
      0.0
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
  pub name: String,
  /// Explicit muscle tags. Kept as raw strings: imported and generated data
  /// carries identifiers outside the canonical set.
  #[serde(default)]
  pub muscle_groups: Vec<String>,
  #[serde(default)]
  pub sets: Vec<ExerciseSet>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub equipment: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<ExerciseCategory>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
}

impl Exercise {
  pub fn new(name: impl Into<String>, sets: Vec<ExerciseSet>) -> Self {
    Self {
      name: name.into(),
      muscle_groups: Vec::new(),
      sets,
      equipment: None,
      category: None,
      notes: None,
    }
  }

  pub fn with_muscle_groups<I, S>(mut self, groups: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.muscle_groups = groups.into_iter().map(Into::into).collect();
    self
  }

  pub fn volume(&self) -> f64 {
    self.sets.iter().map(ExerciseSet::volume).sum()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
  pub id: String,
  pub user: User,
  pub date: NaiveDate,
  pub workout_type: WorkoutType,
  #[serde(default)]
  pub exercises: Vec<Exercise>,
  /// Minutes
  #[serde(default)]
  pub duration: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  /// 1-10 workout quality
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rating: Option<u8>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub body_weight: Option<f64>,
}

impl WorkoutSession {
  pub fn volume(&self) -> f64 {
    self.exercises.iter().map(Exercise::volume).sum()
  }

  pub fn set_count(&self) -> usize {
    self.exercises.iter().map(|e| e.sets.len()).sum()
  }

  /// Check the bounds the type system cannot express
  pub fn validate(&self) -> Result<(), String> {
    if self.exercises.is_empty() {
      return Err("Workout has no exercises".to_string());
    }
    if let Some(rating) = self.rating {
      if !(1..=10).contains(&rating) {
        return Err(format!("Rating must be between 1 and 10, got {}", rating));
      }
    }
    if let Some(bw) = self.body_weight {
      if !bw.is_finite() || bw <= 0.0 {
        return Err(format!("Invalid body weight: {}", bw));
      }
    }
    for exercise in &self.exercises {
      if exercise.name.trim().is_empty() {
        return Err("Exercise name is required".to_string());
      }
      for (i, set) in exercise.sets.iter().enumerate() {
        if set.reps == 0 {
          return Err(format!("{} set {}: reps must be positive", exercise.name, i + 1));
        }
        if !set.weight.is_finite() || set.weight < 0.0 {
          return Err(format!("{} set {}: invalid weight {}", exercise.name, i + 1, set.weight));
        }
      }
    }
    Ok(())
  }
}

/// Generate a fresh session id
pub fn new_session_id() -> String {
  uuid::Uuid::new_v4().simple().to_string()
}
