use super::{Store, StoreError};
use crate::models::{NewSleepEntry, NewTestResult, NewUser, Role, SleepEntry, TestResult, User};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Tables {
  next_id: i64,
  users: Vec<User>,
  sleep_entries: Vec<SleepEntry>,
  test_results: Vec<TestResult>,
}

impl Tables {
  fn next_id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }
}

/// In-process store used for tests, dry runs and offline export
#[derive(Debug, Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
}

/// Files written by [`MemoryStore::export_json`]
#[derive(Debug, Clone, Serialize)]
pub struct ExportPaths {
  pub users: PathBuf,
  pub sleep_entries: PathBuf,
  pub test_results: PathBuf,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Write every table as pretty JSON into `dir` (created if missing)
  pub async fn export_json(&self, dir: &Path) -> Result<ExportPaths, StoreError> {
    std::fs::create_dir_all(dir)?;
    let tables = self.tables.lock().await;

    let paths = ExportPaths {
      users: dir.join("users.json"),
      sleep_entries: dir.join("sleep-entries.json"),
      test_results: dir.join("test-results.json"),
    };

    std::fs::write(&paths.users, serde_json::to_string_pretty(&tables.users)?)?;
    std::fs::write(&paths.sleep_entries, serde_json::to_string_pretty(&tables.sleep_entries)?)?;
    std::fs::write(&paths.test_results, serde_json::to_string_pretty(&tables.test_results)?)?;

    tracing::info!(
      dir = %dir.display(),
      users = tables.users.len(),
      sleep_entries = tables.sleep_entries.len(),
      test_results = tables.test_results.len(),
      "Exported store"
    );

    Ok(paths)
  }
}

fn newest_sleep_first(mut entries: Vec<SleepEntry>) -> Vec<SleepEntry> {
  entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
  entries
}

fn newest_test_first(mut results: Vec<TestResult>) -> Vec<TestResult> {
  results.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
  results
}

fn on_or_after(date: NaiveDate, since: Option<NaiveDate>) -> bool {
  since.map_or(true, |s| date >= s)
}

impl Store for MemoryStore {
  async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
    let mut tables = self.tables.lock().await;
    if tables.users.iter().any(|u| u.email == user.email) {
      return Err(StoreError::Duplicate(user.email));
    }

    let record = User {
      id: tables.next_id(),
      email: user.email,
      name: user.name,
      role: user.role,
      grade: user.grade,
      gender: user.gender,
      created_at: Utc::now(),
    };
    tables.users.push(record.clone());
    Ok(record)
  }

  async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
    let tables = self.tables.lock().await;
    Ok(tables.users.iter().find(|u| u.id == id).cloned())
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
    let tables = self.tables.lock().await;
    Ok(tables.users.iter().find(|u| u.email == email).cloned())
  }

  async fn list_students(&self) -> Result<Vec<User>, StoreError> {
    let tables = self.tables.lock().await;
    Ok(tables.users.iter().filter(|u| u.role == Role::Student).cloned().collect())
  }

  async fn insert_sleep_entry(&self, entry: NewSleepEntry) -> Result<SleepEntry, StoreError> {
    let mut tables = self.tables.lock().await;
    let record = entry.into_entry(tables.next_id(), Utc::now());
    tables.sleep_entries.push(record.clone());
    Ok(record)
  }

  async fn upsert_sleep_entry(&self, entry: NewSleepEntry) -> Result<SleepEntry, StoreError> {
    let mut tables = self.tables.lock().await;
    tables
      .sleep_entries
      .retain(|e| !(e.user_id == entry.user_id && e.date == entry.date));
    let record = entry.into_entry(tables.next_id(), Utc::now());
    tables.sleep_entries.push(record.clone());
    Ok(record)
  }

  async fn find_sleep_entry(&self, user_id: i64, date: NaiveDate) -> Result<Option<SleepEntry>, StoreError> {
    let tables = self.tables.lock().await;
    Ok(
      tables
        .sleep_entries
        .iter()
        .filter(|e| e.user_id == user_id && e.date == date)
        .max_by_key(|e| e.id)
        .cloned(),
    )
  }

  async fn sleep_entries_for_user(&self, user_id: i64, since: Option<NaiveDate>) -> Result<Vec<SleepEntry>, StoreError> {
    let tables = self.tables.lock().await;
    let entries = tables
      .sleep_entries
      .iter()
      .filter(|e| e.user_id == user_id && on_or_after(e.date, since))
      .cloned()
      .collect();
    Ok(newest_sleep_first(entries))
  }

  async fn sleep_entries_since(&self, since: Option<NaiveDate>) -> Result<Vec<SleepEntry>, StoreError> {
    let tables = self.tables.lock().await;
    let entries = tables
      .sleep_entries
      .iter()
      .filter(|e| on_or_after(e.date, since))
      .cloned()
      .collect();
    Ok(newest_sleep_first(entries))
  }

  async fn insert_test_result(&self, result: NewTestResult) -> Result<TestResult, StoreError> {
    let mut tables = self.tables.lock().await;
    let record = result.into_result(tables.next_id(), Utc::now());
    tables.test_results.push(record.clone());
    Ok(record)
  }

  async fn replace_test_result_for_day(&self, result: NewTestResult) -> Result<TestResult, StoreError> {
    let mut tables = self.tables.lock().await;
    let day = result.start_time.date();
    tables
      .test_results
      .retain(|r| !(r.user_id == result.user_id && r.start_time.date() == day));
    let record = result.into_result(tables.next_id(), Utc::now());
    tables.test_results.push(record.clone());
    Ok(record)
  }

  async fn find_test_result(&self, user_id: i64, date: NaiveDate) -> Result<Option<TestResult>, StoreError> {
    let tables = self.tables.lock().await;
    Ok(
      tables
        .test_results
        .iter()
        .filter(|r| r.user_id == user_id && r.start_time.date() == date)
        .max_by_key(|r| r.start_time)
        .cloned(),
    )
  }

  async fn test_results_for_user(&self, user_id: i64, since: Option<NaiveDate>) -> Result<Vec<TestResult>, StoreError> {
    let tables = self.tables.lock().await;
    let results = tables
      .test_results
      .iter()
      .filter(|r| r.user_id == user_id && on_or_after(r.start_time.date(), since))
      .cloned()
      .collect();
    Ok(newest_test_first(results))
  }

  async fn test_results_since(&self, since: Option<NaiveDate>) -> Result<Vec<TestResult>, StoreError> {
    let tables = self.tables.lock().await;
    let results = tables
      .test_results
      .iter()
      .filter(|r| on_or_after(r.start_time.date(), since))
      .cloned()
      .collect();
    Ok(newest_test_first(results))
  }
}
