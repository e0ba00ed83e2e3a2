//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock session factories
//! - Helper assertions

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::llm::DEFAULT_MODEL;
use crate::models::{new_session_id, Exercise, User, WorkoutSession, WorkoutType};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Parse a `YYYY-MM-DD` literal
pub fn date(s: &str) -> NaiveDate {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("Invalid test date")
}

/// A 60 minute push session for Nav with no rating
pub fn mock_session(date_str: &str, exercises: Vec<Exercise>) -> WorkoutSession {
  WorkoutSession {
    id: new_session_id(),
    user: User::Nav,
    date: date(date_str),
    workout_type: WorkoutType::Push,
    exercises,
    duration: 60,
    notes: None,
    rating: None,
    body_weight: None,
  }
}

pub fn mock_session_of_type(date_str: &str, workout_type: WorkoutType) -> WorkoutSession {
  WorkoutSession {
    workout_type,
    ..mock_session(date_str, Vec::new())
  }
}

pub fn mock_session_for(user: User, date_str: &str, exercises: Vec<Exercise>) -> WorkoutSession {
  WorkoutSession {
    user,
    ..mock_session(date_str, exercises)
  }
}

/// Configuration pointing the model client at `api_base` (a mock server)
pub fn mock_config(api_base: &str) -> Config {
  Config {
    db_path: ":memory:".into(),
    gemini_api_key: Some("test-key".to_string()),
    gemini_api_base: api_base.to_string(),
    gemini_model: DEFAULT_MODEL.to_string(),
    log_filter: "info".to_string(),
  }
}

/// ---------------------------------------------------------------------------
/// Assertion Helpers
/// ---------------------------------------------------------------------------

/// Assert that two f64 values are approximately equal within tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = (($left) as f64 - ($right) as f64).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_test_db() {
    let pool = setup_test_db().await;

    let result = sqlx::query("SELECT COUNT(*) as count FROM workout_sessions")
      .fetch_one(&pool)
      .await;
    assert!(result.is_ok(), "workout_sessions table should exist");

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_session_defaults() {
    let a = mock_session("2024-01-01", Vec::new());
    let b = mock_session("2024-01-01", Vec::new());
    assert_ne!(a.id, b.id, "each mock gets a fresh id");
    assert_eq!(a.user, User::Nav);
    assert_eq!(a.date, date("2024-01-01"));

    let legs = mock_session_of_type("2024-01-02", WorkoutType::Legs);
    assert_eq!(legs.workout_type, WorkoutType::Legs);
  }

  #[test]
  fn test_assert_approx_eq_macro() {
    assert_approx_eq!(1.0, 1.0001, 0.001);
    assert_approx_eq!(100.0, 100.05, 0.1);
  }

  #[test]
  #[should_panic(expected = "Values not approximately equal")]
  fn test_assert_approx_eq_macro_fails() {
    assert_approx_eq!(1.0, 2.0, 0.1);
  }
}
