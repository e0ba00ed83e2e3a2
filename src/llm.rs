//! Generative-model integration for workout entry
//!
//! This module talks to the Gemini `generateContent` endpoint to turn a
//! free-text description into a session, and to drive the conversational
//! logging flow. What the model says is not trusted: every generated workout
//! goes through the same validation as an imported file.

use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::models::{new_session_id, User, WorkoutSession};
use crate::taxonomy::all_muscle_groups;
use crate::transfer::session_from_value;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const SAFETY_CATEGORIES: [&str; 4] = [
  "HARM_CATEGORY_HARASSMENT",
  "HARM_CATEGORY_HATE_SPEECH",
  "HARM_CATEGORY_SEXUALLY_EXPLICIT",
  "HARM_CATEGORY_DANGEROUS_CONTENT",
];
const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Serialize)]
pub enum LlmError {
  #[error("API key not configured")]
  MissingApiKey,

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Request failed: {0}")]
  Request(String),

  #[error("API error: {0}")]
  Api(String),

  #[error("Parse error: {0}")]
  Parse(String),
}

/// ---------------------------------------------------------------------------
/// Gemini API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
  contents: Vec<Content>,
  generation_config: GenerationConfig,
  safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
  #[serde(default)]
  parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  temperature: f64,
  top_k: u32,
  top_p: f64,
  max_output_tokens: u32,
}

impl Default for GenerationConfig {
  fn default() -> Self {
    Self {
      temperature: 0.3,
      top_k: 1,
      top_p: 1.0,
      max_output_tokens: 2048,
    }
  }
}

#[derive(Debug, Serialize)]
struct SafetySetting {
  category: &'static str,
  threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
  error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
  message: String,
}

/// ---------------------------------------------------------------------------
/// Conversation Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStage {
  #[default]
  Initial,
  Gathering,
  Confirming,
  Complete,
}

impl ConversationStage {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Initial => "initial",
      Self::Gathering => "gathering",
      Self::Confirming => "confirming",
      Self::Complete => "complete",
    }
  }
}

impl std::str::FromStr for ConversationStage {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "initial" => Ok(Self::Initial),
      "gathering" => Ok(Self::Gathering),
      "confirming" => Ok(Self::Confirming),
      "complete" => Ok(Self::Complete),
      _ => Err(format!("Unknown conversation stage: {}", s)),
    }
  }
}

/// One user message in the logging conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
  pub user_input: String,
  /// Partial workout gathered so far, in export shape
  #[serde(default)]
  pub current_workout_data: Value,
  #[serde(default)]
  pub conversation_stage: ConversationStage,
  pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
  pub response: String,
  pub workout_data: Option<Value>,
  pub stage: ConversationStage,
  pub final_workout: Option<Value>,
}

const FALLBACK_RESPONSE: &str = "I understand you want to log your workout. Could you tell me more details about the exercises you did, including sets, reps, and weights?";
const EMPTY_RESPONSE: &str = "Could you provide more details about your workout?";
const UNAVAILABLE_RESPONSE: &str =
  "I'm having trouble processing that right now. Could you try describing your workout again?";

impl ChatReply {
  /// Reply used when the model answered but not with usable JSON
  pub fn fallback(stage: ConversationStage) -> Self {
    let stage = match stage {
      ConversationStage::Initial => ConversationStage::Gathering,
      other => other,
    };
    Self {
      response: FALLBACK_RESPONSE.to_string(),
      workout_data: None,
      stage,
      final_workout: None,
    }
  }

  /// Reply used when the model could not be reached at all
  pub fn unavailable() -> Self {
    Self {
      response: UNAVAILABLE_RESPONSE.to_string(),
      workout_data: None,
      stage: ConversationStage::Gathering,
      final_workout: None,
    }
  }

  /// Interpret raw model output for a turn that was at `stage`
  pub fn from_model_text(text: &str, stage: ConversationStage) -> Self {
    let parsed = extract_json(text)
      .ok()
      .and_then(|json| serde_json::from_str::<Value>(&json).ok())
      .filter(Value::is_object);

    let Some(reply) = parsed else {
      tracing::warn!("Model reply was not JSON, using fallback");
      return Self::fallback(stage);
    };

    let non_null = |key: &str| reply.get(key).filter(|v| !v.is_null()).cloned();

    Self {
      response: reply
        .get("response")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(EMPTY_RESPONSE)
        .to_string(),
      workout_data: non_null("workoutData"),
      stage: reply
        .get("stage")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(stage),
      final_workout: non_null("finalWorkout"),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Gemini Client
/// ---------------------------------------------------------------------------

pub struct GeminiClient {
  client: Client,
  api_key: String,
  base_url: String,
  model: String,
}

impl GeminiClient {
  pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
    Self {
      client: Client::new(),
      api_key: api_key.into(),
      base_url: base_url.into().trim_end_matches('/').to_string(),
      model: model.into(),
    }
  }

  /// Build a client from configuration. Fails without an API key.
  pub fn from_config(config: &Config) -> Result<Self, LlmError> {
    let api_key = config
      .gemini_api_key
      .clone()
      .filter(|k| !k.trim().is_empty())
      .ok_or(LlmError::MissingApiKey)?;
    Ok(Self::new(api_key, config.gemini_api_base.clone(), config.gemini_model.clone()))
  }

  fn endpoint(&self) -> String {
    format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
  }

  /// Send a single prompt and return the first candidate's text
  pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
    let request = GenerateContentRequest {
      contents: vec![Content {
        parts: vec![Part {
          text: Some(prompt.to_string()),
        }],
      }],
      generation_config: GenerationConfig::default(),
      safety_settings: SAFETY_CATEGORIES
        .iter()
        .map(|&category| SafetySetting {
          category,
          threshold: SAFETY_THRESHOLD,
        })
        .collect(),
    };

    tracing::debug!(model = %self.model, "Sending generateContent request");

    let response = self
      .client
      .post(self.endpoint())
      .header("x-goog-api-key", &self.api_key)
      .header("content-type", "application/json")
      .json(&request)
      .send()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    if !status.is_success() {
      tracing::warn!(status = %status, "Gemini request failed");
      if let Ok(error_resp) = serde_json::from_str::<GeminiErrorResponse>(&body) {
        return Err(LlmError::Api(format!(
          "API request failed: {}: {}",
          status.as_u16(),
          error_resp.error.message
        )));
      }
      return Err(LlmError::Api(format!("API request failed: {}", status.as_u16())));
    }

    let parsed: GenerateContentResponse =
      serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

    parsed
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content)
      .and_then(|c| c.parts.into_iter().next())
      .and_then(|p| p.text)
      .ok_or_else(|| LlmError::Parse("Invalid response from AI".to_string()))
  }

  /// Turn a description into a validated session owned by `user`
  pub async fn generate_workout(
    &self,
    description: &str,
    user: User,
    today: NaiveDate,
  ) -> Result<WorkoutSession, LlmError> {
    if description.trim().is_empty() {
      return Err(LlmError::InvalidInput("Description is required".to_string()));
    }

    let text = self.complete(&workout_prompt(description, today)).await?;
    session_from_model_text(&text, user, today)
  }

  /// Advance the logging conversation by one turn
  pub async fn converse(&self, turn: &ChatTurn, today: NaiveDate) -> Result<ChatReply, LlmError> {
    if turn.user_input.trim().is_empty() {
      return Err(LlmError::InvalidInput("Message is required".to_string()));
    }

    let text = self.complete(&chat_prompt(turn, today)).await?;
    Ok(ChatReply::from_model_text(&text, turn.conversation_stage))
  }
}

/// ---------------------------------------------------------------------------
/// Prompts
/// ---------------------------------------------------------------------------

fn workout_prompt(description: &str, today: NaiveDate) -> String {
  let muscle_groups = all_muscle_groups()
    .iter()
    .map(|g| g.as_str())
    .chain(["biceps", "triceps", "forearms", "quads", "hamstrings", "glutes", "calves", "core"])
    .collect::<Vec<_>>()
    .join(", ");

  include_str!("prompts/generate_workout.txt")
    .replace("{{description}}", description.trim())
    .replace("{{today}}", &today.format("%Y-%m-%d").to_string())
    .replace("{{muscle_groups}}", &muscle_groups)
}

fn chat_prompt(turn: &ChatTurn, today: NaiveDate) -> String {
  let workout = serde_json::to_string_pretty(&turn.current_workout_data).unwrap_or_else(|_| "{}".to_string());

  include_str!("prompts/chat_system.txt")
    .replace("{{user}}", turn.user.as_str())
    .replace("{{today}}", &today.format("%Y-%m-%d").to_string())
    .replace("{{stage}}", turn.conversation_stage.as_str())
    .replace("{{workout}}", &workout)
    .replace("{{input}}", turn.user_input.trim())
}

/// Stamp owner, id and (when absent) date onto a generated workout, then
/// validate it like an imported record
pub fn session_from_model_text(text: &str, user: User, today: NaiveDate) -> Result<WorkoutSession, LlmError> {
  let json = extract_json(text)?;
  let mut value: Value =
    serde_json::from_str(&json).map_err(|e| LlmError::Parse(format!("{}: {}", e, json)))?;

  let obj = value
    .as_object_mut()
    .ok_or_else(|| LlmError::Parse("Generated workout is not an object".to_string()))?;
  obj.insert("user".to_string(), Value::String(user.as_str().to_string()));
  obj.insert("id".to_string(), Value::String(new_session_id()));
  if obj.get("date").and_then(Value::as_str).map_or(true, |d| d.trim().is_empty()) {
    obj.insert("date".to_string(), Value::String(today.format("%Y-%m-%d").to_string()));
  }

  session_from_value(&value, user).map_err(LlmError::Parse)
}

/// Extract JSON from a model response (handles markdown code blocks)
fn extract_json(text: &str) -> Result<String, LlmError> {
  // Try direct parse first
  if text.trim().starts_with('{') {
    return Ok(text.trim().to_string());
  }

  // Look for JSON in code blocks
  if let Some(start) = text.find("```json") {
    let start = start + 7;
    if let Some(end) = text[start..].find("```") {
      return Ok(text[start..start + end].trim().to_string());
    }
  }

  // Look for plain code blocks
  if let Some(start) = text.find("```") {
    let start = start + 3;
    // Skip language identifier if present
    let content_start = text[start..]
      .find('\n')
      .map(|i| start + i + 1)
      .unwrap_or(start);
    if let Some(end) = text[content_start..].find("```") {
      return Ok(text[content_start..content_start + end].trim().to_string());
    }
  }

  // Last resort: find first { to last }
  if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
    if start < end {
      return Ok(text[start..=end].to_string());
    }
  }

  Err(LlmError::Parse("Could not extract JSON from response".to_string()))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
