//! Fine-grained muscle taxonomy
//!
//! Canonical muscle-group identifiers (`chest-upper`, `lats`, ...) as attached
//! to exercises, the coarse body category each one belongs to, and the muscles
//! each workout split targets. Everything here is static lookup data; the
//! keyword taxonomy used for name-based inference lives in `muscle_analyzer`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{WorkoutSession, WorkoutType};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxonomyError {
  #[error("Unknown muscle group: {0}")]
  UnknownMuscleGroup(String),
}

/// ---------------------------------------------------------------------------
/// Coarse body categories
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuscleCategory {
  Chest,
  Back,
  Arms,
  Shoulders,
  Legs,
  Core,
}

impl MuscleCategory {
  pub const ALL: [MuscleCategory; 6] = [
    MuscleCategory::Chest,
    MuscleCategory::Back,
    MuscleCategory::Arms,
    MuscleCategory::Shoulders,
    MuscleCategory::Legs,
    MuscleCategory::Core,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      MuscleCategory::Chest => "chest",
      MuscleCategory::Back => "back",
      MuscleCategory::Arms => "arms",
      MuscleCategory::Shoulders => "shoulders",
      MuscleCategory::Legs => "legs",
      MuscleCategory::Core => "core",
    }
  }
}

impl std::fmt::Display for MuscleCategory {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// ---------------------------------------------------------------------------
/// Fine muscle groups
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MuscleGroup {
  ChestUpper,
  ChestMiddle,
  ChestLower,
  Lats,
  Rhomboids,
  TrapsMiddle,
  TrapsLower,
  RearDelts,
  BicepsLong,
  BicepsShort,
  Brachialis,
  TricepsLong,
  TricepsLateral,
  TricepsMedial,
  ForearmsFlexors,
  ForearmsExtensors,
  DeltsAnterior,
  DeltsMedial,
  DeltsPosterior,
  QuadsVastusLateralis,
  QuadsVastusMedialis,
  QuadsRectusFemoris,
  QuadsVastusIntermedius,
  HamstringsBicepsFemoris,
  HamstringsSemitendinosus,
  HamstringsSemimembranosus,
  GlutesMaximus,
  GlutesMedius,
  GlutesMinimus,
  CalvesGastrocnemius,
  CalvesSoleus,
}

use MuscleGroup::*;

const CHEST: &[MuscleGroup] = &[ChestUpper, ChestMiddle, ChestLower];
const BACK: &[MuscleGroup] = &[Lats, Rhomboids, TrapsMiddle, TrapsLower, RearDelts];
const BICEPS: &[MuscleGroup] = &[BicepsLong, BicepsShort, Brachialis];
const TRICEPS: &[MuscleGroup] = &[TricepsLong, TricepsLateral, TricepsMedial];
const FOREARMS: &[MuscleGroup] = &[ForearmsFlexors, ForearmsExtensors];
const SHOULDERS: &[MuscleGroup] = &[DeltsAnterior, DeltsMedial, DeltsPosterior];
const LEGS: &[MuscleGroup] = &[
  QuadsVastusLateralis,
  QuadsVastusMedialis,
  QuadsRectusFemoris,
  QuadsVastusIntermedius,
  HamstringsBicepsFemoris,
  HamstringsSemitendinosus,
  HamstringsSemimembranosus,
  GlutesMaximus,
  GlutesMedius,
  GlutesMinimus,
  CalvesGastrocnemius,
  CalvesSoleus,
];

/// Muscles each split targets. Used to pre-fill new exercises.
const WORKOUT_TYPE_MEMBERS: [(WorkoutType, &[&[MuscleGroup]]); 4] = [
  (WorkoutType::Arms, &[BICEPS, TRICEPS, FOREARMS]),
  (WorkoutType::Push, &[CHEST, SHOULDERS, TRICEPS]),
  (WorkoutType::Pull, &[BACK, BICEPS, &[DeltsPosterior]]),
  (WorkoutType::Legs, &[LEGS]),
];

/// Shorthand tags the workout generator emits alongside canonical ids
const SHORTHAND_TAGS: &[(&str, MuscleCategory)] = &[
  ("biceps", MuscleCategory::Arms),
  ("triceps", MuscleCategory::Arms),
  ("forearms", MuscleCategory::Arms),
  ("quads", MuscleCategory::Legs),
  ("hamstrings", MuscleCategory::Legs),
  ("glutes", MuscleCategory::Legs),
  ("calves", MuscleCategory::Legs),
  ("core", MuscleCategory::Core),
];

impl MuscleGroup {
  pub const ALL: [MuscleGroup; 31] = [
    ChestUpper,
    ChestMiddle,
    ChestLower,
    Lats,
    Rhomboids,
    TrapsMiddle,
    TrapsLower,
    RearDelts,
    BicepsLong,
    BicepsShort,
    Brachialis,
    TricepsLong,
    TricepsLateral,
    TricepsMedial,
    ForearmsFlexors,
    ForearmsExtensors,
    DeltsAnterior,
    DeltsMedial,
    DeltsPosterior,
    QuadsVastusLateralis,
    QuadsVastusMedialis,
    QuadsRectusFemoris,
    QuadsVastusIntermedius,
    HamstringsBicepsFemoris,
    HamstringsSemitendinosus,
    HamstringsSemimembranosus,
    GlutesMaximus,
    GlutesMedius,
    GlutesMinimus,
    CalvesGastrocnemius,
    CalvesSoleus,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ChestUpper => "chest-upper",
      ChestMiddle => "chest-middle",
      ChestLower => "chest-lower",
      Lats => "lats",
      Rhomboids => "rhomboids",
      TrapsMiddle => "traps-middle",
      TrapsLower => "traps-lower",
      RearDelts => "rear-delts",
      BicepsLong => "biceps-long",
      BicepsShort => "biceps-short",
      Brachialis => "brachialis",
      TricepsLong => "triceps-long",
      TricepsLateral => "triceps-lateral",
      TricepsMedial => "triceps-medial",
      ForearmsFlexors => "forearms-flexors",
      ForearmsExtensors => "forearms-extensors",
      DeltsAnterior => "delts-anterior",
      DeltsMedial => "delts-medial",
      DeltsPosterior => "delts-posterior",
      QuadsVastusLateralis => "quads-vastus-lateralis",
      QuadsVastusMedialis => "quads-vastus-medialis",
      QuadsRectusFemoris => "quads-rectus-femoris",
      QuadsVastusIntermedius => "quads-vastus-intermedius",
      HamstringsBicepsFemoris => "hamstrings-biceps-femoris",
      HamstringsSemitendinosus => "hamstrings-semitendinosus",
      HamstringsSemimembranosus => "hamstrings-semimembranosus",
      GlutesMaximus => "glutes-maximus",
      GlutesMedius => "glutes-medius",
      GlutesMinimus => "glutes-minimus",
      CalvesGastrocnemius => "calves-gastrocnemius",
      CalvesSoleus => "calves-soleus",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      ChestUpper => "Upper Chest",
      ChestMiddle => "Middle Chest",
      ChestLower => "Lower Chest",
      Lats => "Latissimus Dorsi",
      Rhomboids => "Rhomboids",
      TrapsMiddle => "Middle Traps",
      TrapsLower => "Lower Traps",
      RearDelts => "Rear Deltoids",
      BicepsLong => "Biceps Long Head",
      BicepsShort => "Biceps Short Head",
      Brachialis => "Brachialis",
      TricepsLong => "Triceps Long Head",
      TricepsLateral => "Triceps Lateral Head",
      TricepsMedial => "Triceps Medial Head",
      ForearmsFlexors => "Forearm Flexors",
      ForearmsExtensors => "Forearm Extensors",
      DeltsAnterior => "Anterior Deltoid",
      DeltsMedial => "Medial Deltoid",
      DeltsPosterior => "Posterior Deltoid",
      QuadsVastusLateralis => "Vastus Lateralis",
      QuadsVastusMedialis => "Vastus Medialis",
      QuadsRectusFemoris => "Rectus Femoris",
      QuadsVastusIntermedius => "Vastus Intermedius",
      HamstringsBicepsFemoris => "Biceps Femoris",
      HamstringsSemitendinosus => "Semitendinosus",
      HamstringsSemimembranosus => "Semimembranosus",
      GlutesMaximus => "Gluteus Maximus",
      GlutesMedius => "Gluteus Medius",
      GlutesMinimus => "Gluteus Minimus",
      CalvesGastrocnemius => "Gastrocnemius",
      CalvesSoleus => "Soleus",
    }
  }

  /// The category this group belongs to. Nothing maps to `Core` at this
  /// granularity.
  pub fn category(&self) -> MuscleCategory {
    match self {
      ChestUpper | ChestMiddle | ChestLower => MuscleCategory::Chest,
      Lats | Rhomboids | TrapsMiddle | TrapsLower | RearDelts => MuscleCategory::Back,
      BicepsLong | BicepsShort | Brachialis | TricepsLong | TricepsLateral | TricepsMedial
      | ForearmsFlexors | ForearmsExtensors => MuscleCategory::Arms,
      DeltsAnterior | DeltsMedial | DeltsPosterior => MuscleCategory::Shoulders,
      QuadsVastusLateralis
      | QuadsVastusMedialis
      | QuadsRectusFemoris
      | QuadsVastusIntermedius
      | HamstringsBicepsFemoris
      | HamstringsSemitendinosus
      | HamstringsSemimembranosus
      | GlutesMaximus
      | GlutesMedius
      | GlutesMinimus
      | CalvesGastrocnemius
      | CalvesSoleus => MuscleCategory::Legs,
    }
  }
}

impl std::fmt::Display for MuscleGroup {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for MuscleGroup {
  type Err = TaxonomyError;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let needle = s.trim().to_lowercase();
    MuscleGroup::ALL
      .iter()
      .find(|g| g.as_str() == needle)
      .copied()
      .ok_or_else(|| TaxonomyError::UnknownMuscleGroup(s.to_string()))
  }
}

/// Resolve a muscle tag to its coarse category.
///
/// Accepts canonical identifiers and the generator's shorthand tags
/// (`biceps`, `quads`, `core`, ...). Anything else is an error rather than a
/// guessed category.
pub fn category_of_muscle_group(id: &str) -> Result<MuscleCategory, TaxonomyError> {
  if let Ok(group) = id.parse::<MuscleGroup>() {
    return Ok(group.category());
  }

  let needle = id.trim().to_lowercase();
  SHORTHAND_TAGS
    .iter()
    .find(|(tag, _)| *tag == needle)
    .map(|(_, category)| *category)
    .ok_or_else(|| TaxonomyError::UnknownMuscleGroup(id.to_string()))
}

/// Muscles targeted by a workout split, deduplicated, in table order
pub fn muscle_groups_for_workout_type(workout_type: WorkoutType) -> Vec<MuscleGroup> {
  let mut groups: Vec<MuscleGroup> = Vec::new();
  for (_, members) in WORKOUT_TYPE_MEMBERS.iter().filter(|(t, _)| *t == workout_type) {
    for group in members.iter().flat_map(|m| m.iter()) {
      if !groups.contains(group) {
        groups.push(*group);
      }
    }
  }
  groups
}

/// Tag every untagged exercise with the muscles its session's split targets.
/// Exercises that already carry tags are left alone. Returns how many were
/// filled.
pub fn prefill_muscle_groups(session: &mut WorkoutSession) -> usize {
  let defaults: Vec<String> = muscle_groups_for_workout_type(session.workout_type)
    .iter()
    .map(|g| g.as_str().to_string())
    .collect();

  let mut filled = 0;
  for exercise in session.exercises.iter_mut().filter(|e| e.muscle_groups.is_empty()) {
    exercise.muscle_groups = defaults.clone();
    filled += 1;
  }
  filled
}

/// Fine groups belonging to one category
pub fn muscle_groups_in_category(category: MuscleCategory) -> Vec<MuscleGroup> {
  MuscleGroup::ALL
    .iter()
    .filter(|g| g.category() == category)
    .copied()
    .collect()
}

pub fn all_muscle_groups() -> Vec<MuscleGroup> {
  MuscleGroup::ALL.to_vec()
}

/// ---------------------------------------------------------------------------
/// Targeted-muscle summary
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetedMuscle {
  pub id: MuscleGroup,
  pub label: &'static str,
  pub category: MuscleCategory,
}

/// How much of a category a split reaches
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCoverage {
  pub category: MuscleCategory,
  pub targeted: usize,
  pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetedMuscles {
  pub workout_type: WorkoutType,
  pub label: &'static str,
  pub muscles: Vec<TargetedMuscle>,
  /// Categories with at least one targeted group, in category order
  pub coverage: Vec<CategoryCoverage>,
}

impl TargetedMuscles {
  pub fn for_workout_type(workout_type: WorkoutType) -> Self {
    let groups = muscle_groups_for_workout_type(workout_type);

    let coverage = MuscleCategory::ALL
      .iter()
      .filter_map(|category| {
        let members = muscle_groups_in_category(*category);
        let targeted = members.iter().filter(|g| groups.contains(g)).count();
        (targeted > 0).then_some(CategoryCoverage {
          category: *category,
          targeted,
          total: members.len(),
        })
      })
      .collect();

    let muscles = groups
      .into_iter()
      .map(|g| TargetedMuscle {
        id: g,
        label: g.label(),
        category: g.category(),
      })
      .collect();

    Self {
      workout_type,
      label: workout_type.label(),
      muscles,
      coverage,
    }
  }
}
