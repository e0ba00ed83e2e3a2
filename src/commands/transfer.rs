use super::{load_sessions, AppState};
use crate::models::User;
use crate::store::SessionRepository;
use crate::transfer::{export_csv, export_json, import_sessions_json, ExportFormat, ImportReport};

/// Import an exported JSON file into `user`'s history.
///
/// Records for the other user are skipped. Fails when nothing was importable.
pub async fn import_workouts<R: SessionRepository>(
  state: &AppState<R>,
  user: User,
  text: &str,
) -> Result<ImportReport, String> {
  let (sessions, report) =
    import_sessions_json(text, user).map_err(|e| format!("Failed to import workouts: {}", e))?;

  if sessions.is_empty() {
    let mut message = format!("No valid workouts found for {}", user);
    if !report.errors.is_empty() {
      message.push_str(&format!(":\n{}", report.errors.join("\n")));
    }
    return Err(message);
  }

  for session in &sessions {
    state
      .store
      .save_session(session)
      .await
      .map_err(|e| format!("Failed to save imported workout {}: {}", session.id, e))?;
  }

  tracing::info!(user = %user, imported = report.imported, "Import complete");
  Ok(report)
}

pub async fn export_workouts<R: SessionRepository>(
  state: &AppState<R>,
  user: User,
  format: ExportFormat,
) -> Result<String, String> {
  let sessions = load_sessions(state, user).await?;

  let output = match format {
    ExportFormat::Json => export_json(&sessions),
    ExportFormat::Csv => export_csv(&sessions),
  };
  output.map_err(|e| format!("Failed to export workouts: {}", e))
}
