//! Environment-driven configuration
//!
//! Values come from the process environment (after `.env` has been loaded by
//! the binary). Everything except the Gemini key has a default.

use std::env;
use std::path::PathBuf;

use directories::ProjectDirs;
use thiserror::Error;
use url::Url;

use crate::llm::{DEFAULT_API_BASE, DEFAULT_MODEL};

pub const ENV_DB_PATH: &str = "GYM_LOG_DB_PATH";
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_API_BASE: &str = "GEMINI_API_BASE";
pub const ENV_MODEL: &str = "GEMINI_MODEL";
pub const ENV_LOG: &str = "GYM_LOG_LOG";

const DB_FILE_NAME: &str = "gym-log.db";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
  #[error("Could not determine a data directory; set GYM_LOG_DB_PATH")]
  NoDataDir,

  #[error("Invalid value for {key}: {reason}")]
  InvalidValue { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
  pub db_path: PathBuf,
  pub gemini_api_key: Option<String>,
  pub gemini_api_base: String,
  pub gemini_model: String,
  pub log_filter: String,
}

/// Unset and blank are treated the same
fn var(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

/// `<platform data dir>/gym-log.db`
pub fn default_db_path() -> Result<PathBuf, ConfigError> {
  ProjectDirs::from("", "", "gym-log")
    .map(|dirs| dirs.data_dir().join(DB_FILE_NAME))
    .ok_or(ConfigError::NoDataDir)
}

impl Config {
  pub fn from_env() -> Result<Self, ConfigError> {
    let db_path = match var(ENV_DB_PATH) {
      Some(path) => PathBuf::from(path),
      None => default_db_path()?,
    };

    let gemini_api_base = var(ENV_API_BASE).unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    let parsed = Url::parse(&gemini_api_base).map_err(|e| ConfigError::InvalidValue {
      key: ENV_API_BASE,
      reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
      return Err(ConfigError::InvalidValue {
        key: ENV_API_BASE,
        reason: format!("unsupported scheme '{}'", parsed.scheme()),
      });
    }

    let gemini_model = var(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string());
    if gemini_model.contains('/') || gemini_model.contains(char::is_whitespace) {
      return Err(ConfigError::InvalidValue {
        key: ENV_MODEL,
        reason: format!("'{}' is not a model name", gemini_model),
      });
    }

    let log_filter = var(ENV_LOG).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::EnvFilter::try_new(&log_filter).map_err(|e| ConfigError::InvalidValue {
      key: ENV_LOG,
      reason: e.to_string(),
    })?;

    Ok(Self {
      db_path,
      gemini_api_key: var(ENV_API_KEY),
      gemini_api_base,
      gemini_model,
      log_filter,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  const ALL_KEYS: [&str; 5] = [ENV_DB_PATH, ENV_API_KEY, ENV_API_BASE, ENV_MODEL, ENV_LOG];

  fn cleared() -> Vec<(&'static str, Option<&'static str>)> {
    ALL_KEYS.iter().map(|k| (*k, None)).collect()
  }

  #[test]
  #[serial]
  fn test_defaults() {
    temp_env::with_vars(cleared(), || {
      let config = Config::from_env().unwrap();
      assert_eq!(config.gemini_api_key, None);
      assert_eq!(config.gemini_api_base, DEFAULT_API_BASE);
      assert_eq!(config.gemini_model, DEFAULT_MODEL);
      assert_eq!(config.log_filter, "info");
      assert!(config.db_path.ends_with(DB_FILE_NAME));
    });
  }

  #[test]
  #[serial]
  fn test_overrides() {
    temp_env::with_vars(
      vec![
        (ENV_DB_PATH, Some("/tmp/custom.db")),
        (ENV_API_KEY, Some("secret")),
        (ENV_API_BASE, Some("http://localhost:8080")),
        (ENV_MODEL, Some("gemini-1.5-pro")),
        (ENV_LOG, Some("gym_log_lib=debug")),
      ],
      || {
        let config = Config::from_env().unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/custom.db"));
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(config.gemini_api_base, "http://localhost:8080");
        assert_eq!(config.gemini_model, "gemini-1.5-pro");
        assert_eq!(config.log_filter, "gym_log_lib=debug");
      },
    );
  }

  #[test]
  #[serial]
  fn test_blank_key_is_unset() {
    temp_env::with_vars(vec![(ENV_API_KEY, Some("   "))], || {
      assert_eq!(Config::from_env().unwrap().gemini_api_key, None);
    });
  }

  #[test]
  #[serial]
  fn test_invalid_values() {
    temp_env::with_vars(vec![(ENV_API_BASE, Some("not a url"))], || {
      assert!(matches!(
        Config::from_env(),
        Err(ConfigError::InvalidValue { key: ENV_API_BASE, .. })
      ));
    });

    temp_env::with_vars(vec![(ENV_API_BASE, Some("ftp://example.com"))], || {
      assert!(Config::from_env().is_err());
    });

    temp_env::with_vars(vec![(ENV_MODEL, Some("models/gemini"))], || {
      assert!(matches!(
        Config::from_env(),
        Err(ConfigError::InvalidValue { key: ENV_MODEL, .. })
      ));
    });

    temp_env::with_vars(vec![(ENV_LOG, Some("gym_log_lib=loud"))], || {
      assert!(matches!(
        Config::from_env(),
        Err(ConfigError::InvalidValue { key: ENV_LOG, .. })
      ));
    });
  }
}
