pub mod activity;
pub mod analysis;
pub mod commands;
pub mod config;
pub mod llm;
pub mod logging;
pub mod models;
pub mod muscle_analyzer;
pub mod progression;
pub mod store;
pub mod taxonomy;
pub mod transfer;

#[cfg(test)]
pub mod test_utils;

use commands::AppState;
use config::Config;
use store::{initialize_db, SqliteSessionStore, StoreError};

/// Open the configured database and build the application state
pub async fn open(config: Config) -> Result<AppState<SqliteSessionStore>, StoreError> {
  let pool = initialize_db(&config.db_path).await?;
  tracing::info!("Database ready");
  Ok(AppState::new(SqliteSessionStore::new(pool), config))
}
