//! JSON import and JSON/CSV export of workout history
//!
//! Import is record-by-record: one malformed session is reported with its
//! position and skipped, the rest of the file still loads.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{
  new_session_id, Exercise, ExerciseCategory, ExerciseSet, User, WorkoutSession, WorkoutType,
};

#[derive(Debug, Error)]
pub enum TransferError {
  #[error("Invalid JSON format: {0}")]
  InvalidJson(#[from] serde_json::Error),

  #[error("Data must be an array of workout sessions")]
  NotAnArray,

  #[error("No workouts to export")]
  NothingToExport,

  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),

  #[error("CSV output is not valid UTF-8")]
  Encoding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
  Json,
  Csv,
}

impl ExportFormat {
  pub fn extension(&self) -> &'static str {
    match self {
      ExportFormat::Json => "json",
      ExportFormat::Csv => "csv",
    }
  }
}

impl std::str::FromStr for ExportFormat {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "json" => Ok(ExportFormat::Json),
      "csv" => Ok(ExportFormat::Csv),
      _ => Err(format!("Unknown export format: {}", s)),
    }
  }
}

/// Outcome of an import, separate from the sessions themselves
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
  pub imported: usize,
  /// Records that belong to a different user
  pub skipped: usize,
  pub errors: Vec<String>,
}

/// ---------------------------------------------------------------------------
/// Import
/// ---------------------------------------------------------------------------

/// Parse an exported JSON array and keep the sessions owned by `target`.
///
/// Whole-document problems (bad JSON, not an array) are errors. Problems in a
/// single record land in `ImportReport::errors` as `Workout N: ...`.
pub fn import_sessions_json(
  text: &str,
  target: User,
) -> Result<(Vec<WorkoutSession>, ImportReport), TransferError> {
  let data: Value = serde_json::from_str(text)?;
  let records = data.as_array().ok_or(TransferError::NotAnArray)?;

  let mut sessions = Vec::new();
  let mut report = ImportReport::default();

  for (index, record) in records.iter().enumerate() {
    let position = format!("Workout {}", index + 1);
    match parse_session(record, target, &position) {
      Ok(Some(session)) => sessions.push(session),
      Ok(None) => report.skipped += 1,
      Err(message) => {
        tracing::warn!("Rejected import record: {}", message);
        report.errors.push(message);
      }
    }
  }

  report.imported = sessions.len();
  tracing::info!(
    user = %target,
    imported = report.imported,
    skipped = report.skipped,
    rejected = report.errors.len(),
    "Parsed import file"
  );

  Ok((sessions, report))
}

/// Validate one session object that must belong to `user`
pub fn session_from_value(record: &Value, user: User) -> Result<WorkoutSession, String> {
  parse_session(record, user, "Workout")?.ok_or_else(|| format!("Workout: does not belong to {}", user))
}

/// Accept JSON numbers and numeric strings
fn coerce_number(value: &Value) -> Option<f64> {
  let n = match value {
    Value::Number(n) => n.as_f64()?,
    Value::String(s) => s.trim().parse::<f64>().ok()?,
    _ => return None,
  };
  n.is_finite().then_some(n)
}

fn coerce_whole(value: &Value) -> Option<u64> {
  let n = coerce_number(value)?;
  (n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64).then_some(n as u64)
}

/// Optional field: absent and null are both "not provided"
fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
  obj.get(key).filter(|v| !v.is_null())
}

fn optional_text(obj: &Map<String, Value>, key: &str) -> Option<String> {
  field(obj, key)
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(String::from)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn parse_session(
  record: &Value,
  target: User,
  position: &str,
) -> Result<Option<WorkoutSession>, String> {
  let obj = record
    .as_object()
    .ok_or_else(|| format!("{}: Not an object", position))?;

  let user: User = field(obj, "user")
    .and_then(Value::as_str)
    .ok_or_else(|| format!("{}: Missing user", position))?
    .parse()
    .map_err(|e| format!("{}: {}", position, e))?;
  if user != target {
    return Ok(None);
  }

  let date = field(obj, "date")
    .and_then(Value::as_str)
    .ok_or_else(|| format!("{}: Missing date", position))
    .and_then(|raw| parse_date(raw).ok_or_else(|| format!("{}: Invalid date format", position)))?;

  let workout_type: WorkoutType = field(obj, "workoutType")
    .and_then(Value::as_str)
    .ok_or_else(|| format!("{}: Missing workoutType", position))?
    .parse()
    .map_err(|e| format!("{}: {}", position, e))?;

  let raw_exercises = field(obj, "exercises")
    .and_then(Value::as_array)
    .ok_or_else(|| format!("{}: Exercises must be an array", position))?;
  if raw_exercises.is_empty() {
    return Err(format!("{}: No exercises", position));
  }

  let exercises = raw_exercises
    .iter()
    .enumerate()
    .map(|(i, e)| parse_exercise(e, &format!("{}, Exercise {}", position, i + 1)))
    .collect::<Result<Vec<_>, _>>()?;

  let duration = match field(obj, "duration") {
    None => 0,
    Some(v) => coerce_whole(v).ok_or_else(|| format!("{}: Invalid duration", position))? as u32,
  };

  let rating = match field(obj, "rating") {
    None => None,
    Some(v) => match coerce_whole(v) {
      Some(r @ 1..=10) => Some(r as u8),
      _ => return Err(format!("{}: Rating must be between 1 and 10", position)),
    },
  };

  let body_weight = match field(obj, "bodyWeight") {
    None => None,
    Some(v) => Some(
      coerce_number(v)
        .filter(|w| *w > 0.0)
        .ok_or_else(|| format!("{}: Invalid bodyWeight", position))?,
    ),
  };

  let id = optional_text(obj, "id").unwrap_or_else(new_session_id);

  Ok(Some(WorkoutSession {
    id,
    user,
    date,
    workout_type,
    exercises,
    duration,
    notes: optional_text(obj, "notes"),
    rating,
    body_weight,
  }))
}

fn parse_exercise(value: &Value, position: &str) -> Result<Exercise, String> {
  let obj = value
    .as_object()
    .ok_or_else(|| format!("{}: Not an object", position))?;

  let name = optional_text(obj, "name").ok_or_else(|| format!("{}: Missing name", position))?;

  let raw_sets = field(obj, "sets")
    .and_then(Value::as_array)
    .ok_or_else(|| format!("{}: Sets must be an array", position))?;

  let sets = raw_sets
    .iter()
    .enumerate()
    .map(|(i, s)| parse_set(s, &format!("{}, Set {}", position, i + 1)))
    .collect::<Result<Vec<_>, _>>()?;

  let muscle_groups = field(obj, "muscleGroups")
    .and_then(Value::as_array)
    .map(|tags| {
      tags
        .iter()
        .filter_map(Value::as_str)
        .map(String::from)
        .collect()
    })
    .unwrap_or_default();

  let category = optional_text(obj, "category").and_then(|c| match c.parse::<ExerciseCategory>() {
    Ok(category) => Some(category),
    Err(e) => {
      tracing::debug!("{}: dropping category: {}", position, e);
      None
    }
  });

  Ok(Exercise {
    name,
    muscle_groups,
    sets,
    equipment: optional_text(obj, "equipment"),
    category,
    notes: optional_text(obj, "notes"),
  })
}

fn parse_set(value: &Value, position: &str) -> Result<ExerciseSet, String> {
  let obj = value
    .as_object()
    .ok_or_else(|| format!("{}: Not an object", position))?;

  let reps = field(obj, "reps")
    .and_then(coerce_whole)
    .filter(|r| *r > 0)
    .ok_or_else(|| format!("{}: Invalid reps", position))? as u32;

  let weight = field(obj, "weight")
    .and_then(coerce_number)
    .filter(|w| *w >= 0.0)
    .ok_or_else(|| format!("{}: Invalid weight", position))?;

  let rpe = match field(obj, "rpe") {
    None => None,
    Some(v) => Some(coerce_number(v).ok_or_else(|| format!("{}: Invalid rpe", position))?),
  };

  let rest_time = match field(obj, "restTime") {
    None => None,
    Some(v) => Some(coerce_whole(v).ok_or_else(|| format!("{}: Invalid restTime", position))? as u32),
  };

  Ok(ExerciseSet {
    reps,
    weight,
    rpe,
    notes: optional_text(obj, "notes"),
    rest_time,
  })
}

/// ---------------------------------------------------------------------------
/// Export
/// ---------------------------------------------------------------------------

pub const CSV_HEADERS: [&str; 9] = [
  "Date",
  "Workout Type",
  "Exercise",
  "Set Number",
  "Reps",
  "Weight",
  "RPE",
  "Duration (min)",
  "Notes",
];

/// `nav-workouts-2024-01-31.json`
pub fn export_file_name(user: User, format: ExportFormat, today: NaiveDate) -> String {
  format!(
    "{}-workouts-{}.{}",
    user.as_str().to_lowercase(),
    today.format("%Y-%m-%d"),
    format.extension()
  )
}

pub fn export_json(sessions: &[WorkoutSession]) -> Result<String, TransferError> {
  Ok(serde_json::to_string_pretty(sessions)?)
}

/// One row per set, every field quoted
pub fn export_csv(sessions: &[WorkoutSession]) -> Result<String, TransferError> {
  if sessions.is_empty() {
    return Err(TransferError::NothingToExport);
  }

  let mut writer = csv::WriterBuilder::new()
    .quote_style(csv::QuoteStyle::Always)
    .terminator(csv::Terminator::Any(b'\n'))
    .from_writer(Vec::new());

  writer.write_record(CSV_HEADERS)?;

  for session in sessions {
    for exercise in &session.exercises {
      for (index, set) in exercise.sets.iter().enumerate() {
        let notes = [&session.notes, &exercise.notes, &set.notes]
          .into_iter()
          .flatten()
          .filter(|n| !n.is_empty())
          .map(String::as_str)
          .collect::<Vec<_>>()
          .join("; ");

        writer.write_record([
          session.date.format("%Y-%m-%d").to_string(),
          session.workout_type.to_string(),
          exercise.name.clone(),
          (index + 1).to_string(),
          set.reps.to_string(),
          set.weight.to_string(),
          set.rpe.map(|r| r.to_string()).unwrap_or_default(),
          session.duration.to_string(),
          notes,
        ])?;
      }
    }
  }

  let bytes = writer
    .into_inner()
    .map_err(|e| TransferError::Csv(e.into_error().into()))?;
  String::from_utf8(bytes).map_err(|_| TransferError::Encoding)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{date, mock_session};

  const SAMPLE: &str = r#"[
    {
      "id": "keep-me",
      "user": "Nav",
      "date": "2024-01-05",
      "workoutType": "push",
      "exercises": [
        {"name": "Chest Press", "muscleGroups": ["chest-middle"], "sets": [{"reps": "10", "weight": "100"}]}
      ],
      "duration": "45",
      "rating": 8
    },
    {
      "user": "Delchan",
      "date": "2024-01-05",
      "workoutType": "legs",
      "exercises": [{"name": "Squat", "sets": [{"reps": 5, "weight": 60}]}]
    },
    {
      "user": "Nav",
      "date": "not a date",
      "workoutType": "pull",
      "exercises": [{"name": "Row", "sets": []}]
    },
    {
      "user": "Nav",
      "date": "2024-01-06T09:30:00Z",
      "workoutType": "pull",
      "exercises": [{"name": "Row", "sets": [{"reps": 8, "weight": 50}]}]
    }
  ]"#;

  #[test]
  fn test_import_filters_validates_and_coerces() {
    // Act
    let (sessions, report) = import_sessions_json(SAMPLE, User::Nav).unwrap();

    // Assert
    assert_eq!(report.imported, 2);
    assert_eq!(report.skipped, 1, "Delchan's record is skipped, not rejected");
    assert_eq!(report.errors, vec!["Workout 3: Invalid date format".to_string()]);

    let first = &sessions[0];
    assert_eq!(first.id, "keep-me");
    assert_eq!(first.duration, 45);
    assert_eq!(first.rating, Some(8));
    assert_eq!(first.exercises[0].sets[0].reps, 10);
    assert_eq!(first.volume(), 1000.0);

    let second = &sessions[1];
    assert_eq!(second.date, date("2024-01-06"));
    assert!(!second.id.is_empty(), "missing id is generated");
  }

  #[test]
  fn test_import_rejects_bad_sets_with_position() {
    let text = r#"[
      {"user": "Nav", "date": "2024-01-01", "workoutType": "arms",
       "exercises": [
         {"name": "Curl", "sets": [{"reps": 10, "weight": 10}]},
         {"name": "Dip", "sets": [{"reps": 10, "weight": 0}, {"reps": 0, "weight": 0}]}
       ]},
      {"user": "Nav", "date": "2024-01-02", "workoutType": "arms",
       "exercises": [{"name": "Curl", "sets": [{"reps": 10, "weight": "heavy"}]}]},
      {"user": "Nav", "date": "2024-01-03", "workoutType": "arms",
       "exercises": [{"name": "Curl", "sets": [{"reps": 10, "weight": -5}]}]},
      {"user": "Nav", "date": "2024-01-04", "workoutType": "arms", "rating": 11,
       "exercises": [{"name": "Curl", "sets": [{"reps": 10, "weight": 5}]}]},
      {"user": "Nav", "date": "2024-01-05", "workoutType": "cardio",
       "exercises": [{"name": "Curl", "sets": [{"reps": 10, "weight": 5}]}]},
      {"user": "Nav", "date": "2024-01-06", "workoutType": "arms", "exercises": []}
    ]"#;

    let (sessions, report) = import_sessions_json(text, User::Nav).unwrap();

    assert!(sessions.is_empty());
    assert_eq!(
      report.errors,
      vec![
        "Workout 1, Exercise 2, Set 2: Invalid reps".to_string(),
        "Workout 2, Exercise 1, Set 1: Invalid weight".to_string(),
        "Workout 3, Exercise 1, Set 1: Invalid weight".to_string(),
        "Workout 4: Rating must be between 1 and 10".to_string(),
        "Workout 5: Unknown workout type: cardio".to_string(),
        "Workout 6: No exercises".to_string(),
      ]
    );
  }

  #[test]
  fn test_import_document_errors() {
    assert!(matches!(
      import_sessions_json("{not json", User::Nav),
      Err(TransferError::InvalidJson(_))
    ));
    assert!(matches!(
      import_sessions_json(r#"{"user": "Nav"}"#, User::Nav),
      Err(TransferError::NotAnArray)
    ));
  }

  #[test]
  fn test_export_json_reimports() {
    let mut session = mock_session(
      "2024-02-01",
      vec![Exercise::new("Squat", vec![ExerciseSet::new(5, 100.0)]).with_muscle_groups(["quadriceps"])],
    );
    session.rating = Some(7);

    let json = export_json(std::slice::from_ref(&session)).unwrap();
    let (back, report) = import_sessions_json(&json, User::Nav).unwrap();

    assert!(report.errors.is_empty());
    assert_eq!(back, vec![session]);
  }

  #[test]
  fn test_export_csv_rows() {
    let mut session = mock_session(
      "2024-02-01",
      vec![Exercise::new(
        "Bench \"Flat\"",
        vec![ExerciseSet::new(10, 62.5), ExerciseSet::new(8, 100.0)],
      )],
    );
    session.duration = 50;
    session.notes = Some("felt good".into());
    session.exercises[0].sets[1].rpe = Some(9.0);
    session.exercises[0].sets[1].notes = Some("grindy".into());

    let csv = export_csv(&[session]).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(
      lines[0],
      r#""Date","Workout Type","Exercise","Set Number","Reps","Weight","RPE","Duration (min)","Notes""#
    );
    assert_eq!(
      lines[1],
      r#""2024-02-01","push","Bench ""Flat""","1","10","62.5","","50","felt good""#
    );
    assert_eq!(
      lines[2],
      r#""2024-02-01","push","Bench ""Flat""","2","8","100","9","50","felt good; grindy""#
    );
  }

  #[test]
  fn test_export_csv_empty_is_error() {
    assert!(matches!(export_csv(&[]), Err(TransferError::NothingToExport)));
  }

  #[test]
  fn test_export_file_name() {
    assert_eq!(
      export_file_name(User::Delchan, ExportFormat::Csv, date("2024-03-09")),
      "delchan-workouts-2024-03-09.csv"
    );
  }
}
