//! Natural-language workout entry

use chrono::NaiveDate;

use super::{add_workout, AppState};
use crate::llm::{ChatReply, ChatTurn, GeminiClient, LlmError};
use crate::models::{User, WorkoutSession};
use crate::store::SessionRepository;

/// Generate a session from a description. With `save`, it is also stored.
pub async fn generate_workout<R: SessionRepository>(
  state: &AppState<R>,
  user: User,
  description: &str,
  today: NaiveDate,
  save: bool,
) -> Result<WorkoutSession, String> {
  let client = GeminiClient::from_config(&state.config).map_err(|e| e.to_string())?;

  let session = client
    .generate_workout(description, user, today)
    .await
    .map_err(|e| format!("Failed to generate workout: {}", e))?;

  if save {
    return add_workout(state, session).await;
  }
  Ok(session)
}

/// One turn of the logging conversation.
///
/// Transport and API failures do not break the conversation: they produce the
/// "having trouble" reply instead of an error.
pub async fn chat_turn<R: SessionRepository>(
  state: &AppState<R>,
  turn: &ChatTurn,
  today: NaiveDate,
) -> Result<ChatReply, String> {
  let client = GeminiClient::from_config(&state.config).map_err(|e| e.to_string())?;

  match client.converse(turn, today).await {
    Ok(reply) => Ok(reply),
    Err(LlmError::InvalidInput(msg)) => Err(msg),
    Err(e) => {
      tracing::warn!("Chat turn failed: {}", e);
      Ok(ChatReply::unavailable())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::commands::list_workouts;
  use crate::llm::ConversationStage;
  use crate::store::InMemorySessionStore;
  use crate::test_utils::{date, mock_config};

  const MODEL_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

  fn reply_with(text: &str) -> String {
    serde_json::json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}).to_string()
  }

  #[tokio::test]
  async fn test_generate_and_save() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", MODEL_PATH)
      .with_status(200)
      .with_body(reply_with(
        r#"{"workoutType": "arms", "date": "2024-04-02", "duration": 30,
            "exercises": [{"name": "Biceps Curl", "muscleGroups": ["biceps"], "sets": [{"reps": 12, "weight": 12.5}]}]}"#,
      ))
      .expect(2)
      .create_async()
      .await;

    let state = AppState::new(InMemorySessionStore::new(), mock_config(&server.url()));

    let preview = generate_workout(&state, User::Delchan, "curls", date("2024-04-03"), false)
      .await
      .unwrap();
    assert_eq!(preview.date, date("2024-04-02"));
    assert!(list_workouts(&state, User::Delchan, None).await.unwrap().is_empty());

    let saved = generate_workout(&state, User::Delchan, "curls", date("2024-04-03"), true)
      .await
      .unwrap();
    let stored = list_workouts(&state, User::Delchan, None).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, saved.id);
  }

  #[tokio::test]
  async fn test_generate_without_api_key() {
    let mut config = mock_config("http://localhost");
    config.gemini_api_key = None;
    let state = AppState::new(InMemorySessionStore::new(), config);

    let err = generate_workout(&state, User::Nav, "squats", date("2024-04-03"), false)
      .await
      .unwrap_err();
    assert_eq!(err, "API key not configured");
  }

  #[tokio::test]
  async fn test_chat_turn_api_failure_falls_back() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", MODEL_PATH)
      .with_status(500)
      .create_async()
      .await;

    let state = AppState::new(InMemorySessionStore::new(), mock_config(&server.url()));
    let turn = ChatTurn {
      user_input: "bench 3x10 at 60".to_string(),
      current_workout_data: serde_json::Value::Null,
      conversation_stage: ConversationStage::Confirming,
      user: User::Nav,
    };

    let reply = chat_turn(&state, &turn, date("2024-04-03")).await.unwrap();
    assert_eq!(reply, ChatReply::unavailable());
  }
}
