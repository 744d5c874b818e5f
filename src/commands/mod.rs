//! Live flows behind the CLI
//!
//! Each command takes the store (and provider, where needed) explicitly and
//! returns a typed result; printing is the CLI's job.

pub mod sleep;
pub mod stats;
pub mod test;

pub use sleep::{submit_sleep_entry, SleepForm};
pub use stats::{cohort_report, dashboard_from_export, student_dashboard};
pub use test::{submit_test, TestAttempt};

use crate::config::ConfigError;
use crate::models::User;
use crate::questions::QuestionError;
use crate::store::{Store, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Question(#[from] QuestionError),

  #[error("No user matching {0}")]
  UnknownUser(String),

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

/// Look a user up by numeric id or by email
pub async fn resolve_user<S: Store>(store: &S, key: &str) -> Result<User, CommandError> {
  let key = key.trim();
  let found = match key.parse::<i64>() {
    Ok(id) => store.find_user(id).await?,
    Err(_) => store.find_user_by_email(key).await?,
  };
  found.ok_or_else(|| CommandError::UnknownUser(key.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;
  use crate::test_utils::mock_new_student;

  #[tokio::test]
  async fn test_resolve_user() {
    let store = MemoryStore::new();
    let created = store.insert_user(mock_new_student("aruzhan@example.kz", 10)).await.unwrap();

    let found = resolve_user(&store, "aruzhan@example.kz").await.unwrap();
    assert_eq!(found.id, created.id);

    let by_id = resolve_user(&store, &created.id.to_string()).await.unwrap();
    assert_eq!(by_id.email, "aruzhan@example.kz");

    let missing = resolve_user(&store, "nobody@example.kz").await;
    assert!(matches!(missing, Err(CommandError::UnknownUser(_))));
    assert!(matches!(resolve_user(&store, "999").await, Err(CommandError::UnknownUser(_))));
  }
}
