pub mod analytics;
pub mod assistant;
pub mod transfer;

use crate::config::Config;
use crate::models::{new_session_id, User, WorkoutSession};
use crate::store::SessionRepository;
use crate::taxonomy::prefill_muscle_groups;

/// Shared application state: the session store plus configuration
pub struct AppState<R: SessionRepository> {
  pub store: R,
  pub config: Config,
}

impl<R: SessionRepository> AppState<R> {
  pub fn new(store: R, config: Config) -> Self {
    Self { store, config }
  }
}

/// Load a user's sessions for the analytics commands
pub(crate) async fn load_sessions<R: SessionRepository>(
  state: &AppState<R>,
  user: User,
) -> Result<Vec<WorkoutSession>, String> {
  state
    .store
    .list_sessions(user)
    .await
    .map_err(|e| format!("Failed to fetch workouts: {}", e))
}

/// Sessions newest first; equal dates keep insertion order
pub async fn list_workouts<R: SessionRepository>(
  state: &AppState<R>,
  user: User,
  limit: Option<usize>,
) -> Result<Vec<WorkoutSession>, String> {
  let mut sessions = load_sessions(state, user).await?;
  sessions.sort_by(|a, b| b.date.cmp(&a.date));
  if let Some(limit) = limit {
    sessions.truncate(limit);
  }
  Ok(sessions)
}

pub async fn get_workout<R: SessionRepository>(
  state: &AppState<R>,
  id: &str,
) -> Result<Option<WorkoutSession>, String> {
  state
    .store
    .get_session(id)
    .await
    .map_err(|e| format!("Failed to fetch workout: {}", e))
}

/// Validate and store a session, assigning an id when it has none.
/// Untagged exercises get the muscles of the session's split.
pub async fn add_workout<R: SessionRepository>(
  state: &AppState<R>,
  mut session: WorkoutSession,
) -> Result<WorkoutSession, String> {
  session.validate().map_err(|e| format!("Invalid workout: {}", e))?;
  if session.id.trim().is_empty() {
    session.id = new_session_id();
  }
  let filled = prefill_muscle_groups(&mut session);
  if filled > 0 {
    tracing::debug!(session_id = %session.id, filled, "Pre-filled muscle groups from workout type");
  }

  state
    .store
    .save_session(&session)
    .await
    .map_err(|e| format!("Failed to save workout: {}", e))?;

  tracing::info!(session_id = %session.id, user = %session.user, "Workout saved");
  Ok(session)
}

pub async fn delete_workout<R: SessionRepository>(state: &AppState<R>, id: &str) -> Result<bool, String> {
  state
    .store
    .delete_session(id)
    .await
    .map_err(|e| format!("Failed to delete workout: {}", e))
}

/// Remove every session belonging to `user`
pub async fn clear_user_data<R: SessionRepository>(state: &AppState<R>, user: User) -> Result<u64, String> {
  state
    .store
    .clear_user(user)
    .await
    .map_err(|e| format!("Failed to clear data: {}", e))
}
