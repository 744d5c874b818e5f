//! Persistence seam
//!
//! The generator, live flows and dashboard only see [`Store`]. `SqliteStore`
//! backs the CLI; `MemoryStore` backs tests, dry runs and offline export.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::models::{NewSleepEntry, NewTestResult, NewUser, SleepEntry, TestResult, User};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Corrupt record: {0}")]
  Decode(String),

  #[error("Duplicate record: {0}")]
  Duplicate(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Record access shared by every backend.
///
/// `since` bounds are inclusive calendar days. Lists come back newest first.
#[allow(async_fn_in_trait)]
pub trait Store {
  async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
  async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError>;
  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
  async fn list_students(&self) -> Result<Vec<User>, StoreError>;

  async fn insert_sleep_entry(&self, entry: NewSleepEntry) -> Result<SleepEntry, StoreError>;
  /// Replace any entry for the same (user, date)
  async fn upsert_sleep_entry(&self, entry: NewSleepEntry) -> Result<SleepEntry, StoreError>;
  async fn find_sleep_entry(&self, user_id: i64, date: NaiveDate) -> Result<Option<SleepEntry>, StoreError>;
  async fn sleep_entries_for_user(&self, user_id: i64, since: Option<NaiveDate>) -> Result<Vec<SleepEntry>, StoreError>;
  async fn sleep_entries_since(&self, since: Option<NaiveDate>) -> Result<Vec<SleepEntry>, StoreError>;

  async fn insert_test_result(&self, result: NewTestResult) -> Result<TestResult, StoreError>;
  /// Replace any result whose start time falls on the same calendar day
  async fn replace_test_result_for_day(&self, result: NewTestResult) -> Result<TestResult, StoreError>;
  async fn find_test_result(&self, user_id: i64, date: NaiveDate) -> Result<Option<TestResult>, StoreError>;
  async fn test_results_for_user(&self, user_id: i64, since: Option<NaiveDate>) -> Result<Vec<TestResult>, StoreError>;
  async fn test_results_since(&self, since: Option<NaiveDate>) -> Result<Vec<TestResult>, StoreError>;
}
