//! Session persistence
//!
//! Analytics never touch storage directly: callers load a user's sessions
//! through a `SessionRepository` and hand the snapshot to the pure functions.

use std::fs;
use std::path::Path;
use std::sync::RwLock;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use thiserror::Error;

use crate::models::{User, WorkoutSession};

pub type DbPool = SqlitePool;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Storage for workout sessions.
///
/// `list_sessions` returns a user's sessions in insertion order. Saving a
/// session whose id already exists replaces it in place.
#[allow(async_fn_in_trait)]
pub trait SessionRepository {
  async fn list_sessions(&self, user: User) -> Result<Vec<WorkoutSession>, StoreError>;

  async fn get_session(&self, id: &str) -> Result<Option<WorkoutSession>, StoreError>;

  async fn save_session(&self, session: &WorkoutSession) -> Result<(), StoreError>;

  /// Returns whether a session was removed
  async fn delete_session(&self, id: &str) -> Result<bool, StoreError>;

  /// Remove every session of `user`, returning how many were removed
  async fn clear_user(&self, user: User) -> Result<u64, StoreError>;
}

/// ---------------------------------------------------------------------------
/// SQLite
/// ---------------------------------------------------------------------------

/// Open (creating if needed) the database file and run migrations
pub async fn initialize_db(db_path: &Path) -> Result<DbPool, StoreError> {
  if let Some(parent) = db_path.parent() {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(parent)?;
    }
  }

  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
  tracing::info!("Initializing database at: {}", db_path.display());

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::debug!("Database initialized successfully");
  Ok(pool)
}

#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
  pool: DbPool,
}

impl SqliteSessionStore {
  pub fn new(pool: DbPool) -> Self {
    Self { pool }
  }
}

/// Rows that no longer decode are skipped rather than failing the listing
fn decode_row(id: &str, payload: &str) -> Option<WorkoutSession> {
  match serde_json::from_str::<WorkoutSession>(payload) {
    Ok(session) => Some(session),
    Err(e) => {
      tracing::warn!(session_id = %id, "Skipping unreadable stored session: {}", e);
      None
    }
  }
}

impl SessionRepository for SqliteSessionStore {
  async fn list_sessions(&self, user: User) -> Result<Vec<WorkoutSession>, StoreError> {
    let rows: Vec<(String, String)> = sqlx::query_as(
      r#"
      SELECT id, payload_json
      FROM workout_sessions
      WHERE user = ?1
      ORDER BY rowid ASC
      "#,
    )
    .bind(user.as_str())
    .fetch_all(&self.pool)
    .await?;

    Ok(
      rows
        .iter()
        .filter_map(|(id, payload)| decode_row(id, payload))
        .collect(),
    )
  }

  async fn get_session(&self, id: &str) -> Result<Option<WorkoutSession>, StoreError> {
    let row: Option<(String, String)> =
      sqlx::query_as("SELECT id, payload_json FROM workout_sessions WHERE id = ?1")
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

    Ok(row.and_then(|(id, payload)| decode_row(&id, &payload)))
  }

  async fn save_session(&self, session: &WorkoutSession) -> Result<(), StoreError> {
    let payload = serde_json::to_string(session)?;

    sqlx::query(
      r#"
      INSERT INTO workout_sessions (id, user, date, workout_type, duration_minutes, payload_json)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6)
      ON CONFLICT(id) DO UPDATE SET
        user = excluded.user,
        date = excluded.date,
        workout_type = excluded.workout_type,
        duration_minutes = excluded.duration_minutes,
        payload_json = excluded.payload_json,
        updated_at = CURRENT_TIMESTAMP
      "#,
    )
    .bind(&session.id)
    .bind(session.user.as_str())
    .bind(session.date)
    .bind(session.workout_type.as_str())
    .bind(session.duration as i64)
    .bind(payload)
    .execute(&self.pool)
    .await?;

    tracing::debug!(session_id = %session.id, user = %session.user, "Saved session");
    Ok(())
  }

  async fn delete_session(&self, id: &str) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM workout_sessions WHERE id = ?1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn clear_user(&self, user: User) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM workout_sessions WHERE user = ?1")
      .bind(user.as_str())
      .execute(&self.pool)
      .await?;

    tracing::info!(user = %user, removed = result.rows_affected(), "Cleared sessions");
    Ok(result.rows_affected())
  }
}

/// ---------------------------------------------------------------------------
/// In-memory
/// ---------------------------------------------------------------------------

/// Volatile store, used by tests and dry runs
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
  sessions: RwLock<Vec<WorkoutSession>>,
}

impl InMemorySessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_sessions(sessions: Vec<WorkoutSession>) -> Self {
    Self {
      sessions: RwLock::new(sessions),
    }
  }

  fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<WorkoutSession>> {
    self.sessions.read().unwrap_or_else(|e| e.into_inner())
  }

  fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<WorkoutSession>> {
    self.sessions.write().unwrap_or_else(|e| e.into_inner())
  }
}

impl SessionRepository for InMemorySessionStore {
  async fn list_sessions(&self, user: User) -> Result<Vec<WorkoutSession>, StoreError> {
    Ok(self.read().iter().filter(|s| s.user == user).cloned().collect())
  }

  async fn get_session(&self, id: &str) -> Result<Option<WorkoutSession>, StoreError> {
    Ok(self.read().iter().find(|s| s.id == id).cloned())
  }

  async fn save_session(&self, session: &WorkoutSession) -> Result<(), StoreError> {
    let mut sessions = self.write();
    match sessions.iter_mut().find(|s| s.id == session.id) {
      Some(existing) => *existing = session.clone(),
      None => sessions.push(session.clone()),
    }
    Ok(())
  }

  async fn delete_session(&self, id: &str) -> Result<bool, StoreError> {
    let mut sessions = self.write();
    let before = sessions.len();
    sessions.retain(|s| s.id != id);
    Ok(sessions.len() < before)
  }

  async fn clear_user(&self, user: User) -> Result<u64, StoreError> {
    let mut sessions = self.write();
    let before = sessions.len();
    sessions.retain(|s| s.user != user);
    Ok((before - sessions.len()) as u64)
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{Exercise, ExerciseSet};
  use crate::test_utils::{mock_session, mock_session_for, setup_test_db, teardown_test_db};

  /// Shared behaviour every repository must satisfy
  async fn check_repository_contract<R: SessionRepository>(repo: &R) {
    // Arrange: insertion order is not date order
    let first = mock_session("2024-03-01", vec![Exercise::new("Squat", vec![ExerciseSet::new(5, 100.0)])]);
    let second = mock_session("2024-01-01", Vec::new());
    let other = mock_session_for(User::Delchan, "2024-02-01", Vec::new());

    repo.save_session(&first).await.unwrap();
    repo.save_session(&second).await.unwrap();
    repo.save_session(&other).await.unwrap();

    // Act + Assert: listing is per user, in insertion order
    let listed = repo.list_sessions(User::Nav).await.unwrap();
    assert_eq!(
      listed.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
      vec![first.id.as_str(), second.id.as_str()]
    );
    assert_eq!(listed[0], first, "session should round-trip intact");

    // Upsert keeps position
    let mut edited = first.clone();
    edited.duration = 90;
    edited.rating = Some(9);
    repo.save_session(&edited).await.unwrap();
    let listed = repo.list_sessions(User::Nav).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first.id);
    assert_eq!(listed[0].rating, Some(9));

    assert_eq!(repo.get_session(&other.id).await.unwrap(), Some(other.clone()));
    assert_eq!(repo.get_session("missing").await.unwrap(), None);

    assert!(repo.delete_session(&second.id).await.unwrap());
    assert!(!repo.delete_session(&second.id).await.unwrap(), "second delete is a no-op");

    assert_eq!(repo.clear_user(User::Nav).await.unwrap(), 1);
    assert!(repo.list_sessions(User::Nav).await.unwrap().is_empty());
    assert_eq!(repo.list_sessions(User::Delchan).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_sqlite_store_contract() {
    let pool = setup_test_db().await;
    let store = SqliteSessionStore::new(pool.clone());

    check_repository_contract(&store).await;

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_in_memory_store_contract() {
    let store = InMemorySessionStore::new();
    check_repository_contract(&store).await;
  }

  #[tokio::test]
  async fn test_sqlite_store_skips_corrupt_rows() {
    let pool = setup_test_db().await;
    let store = SqliteSessionStore::new(pool.clone());

    let good = mock_session("2024-01-01", Vec::new());
    store.save_session(&good).await.unwrap();
    sqlx::query(
      "INSERT INTO workout_sessions (id, user, date, workout_type, payload_json) VALUES ('bad', 'Nav', '2024-01-02', 'push', '{not json')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let listed = store.list_sessions(User::Nav).await.unwrap();
    assert_eq!(listed.len(), 1, "corrupt row should be skipped");
    assert_eq!(store.get_session("bad").await.unwrap(), None);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_initialize_db_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("gym-log.db");

    let pool = initialize_db(&path).await.unwrap();
    assert!(path.exists());

    let store = SqliteSessionStore::new(pool.clone());
    store.save_session(&mock_session("2024-01-01", Vec::new())).await.unwrap();
    assert_eq!(store.list_sessions(User::Nav).await.unwrap().len(), 1);

    pool.close().await;
  }
}
