//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock record factories
//! - Helper assertions

use crate::models::{
  Difficulty, Gender, NewSleepEntry, NewTestResult, NewUser, QuestionSnapshot, Role, User,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use sqlx::SqlitePool;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn mock_new_student(email: &str, grade: i64) -> NewUser {
  NewUser {
    email: email.to_string(),
    name: "Test Student".to_string(),
    role: Role::Student,
    grade: Some(grade),
    gender: Some(Gender::Male),
  }
}

pub fn mock_user(id: i64, grade: i64, gender: Gender) -> User {
  User {
    id,
    email: format!("student{}@sleepystudy.kz", id),
    name: format!("Student {}", id),
    role: Role::Student,
    grade: Some(grade),
    gender: Some(gender),
    created_at: Utc::now(),
  }
}

/// Sleep entry going to bed at 22:30 on `date`; wake follows from `duration`
pub fn mock_new_sleep_entry(user_id: i64, date: NaiveDate, duration: f64, quality: f64) -> NewSleepEntry {
  let bed_time = date.and_hms_opt(22, 30, 0).expect("valid time");
  let wake_time = bed_time + Duration::minutes((duration * 60.0).round() as i64);

  NewSleepEntry {
    user_id,
    date,
    bed_time,
    wake_time,
    sleep_duration: duration,
    sleep_quality: quality,
    screen_time: 2.0,
    caffeine_intake: 80,
    stress_level: 3.0,
    notes: None,
  }
}

/// Five-question medium test with the first `score / 20` answers correct
pub fn mock_new_test_result(user_id: i64, start_time: NaiveDateTime, score: i64) -> NewTestResult {
  let correct = (score / 20) as usize;
  let questions = (0..5)
    .map(|i| QuestionSnapshot {
      question: format!("Question {}", i + 1),
      options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
      user_answer: Some(if i < correct { "A".into() } else { "B".into() }),
      correct_answer: "A".into(),
      explanation: None,
    })
    .collect();

  NewTestResult {
    user_id,
    start_time,
    end_time: start_time + Duration::minutes(10),
    questions,
    score,
    adjusted_score: Some(score),
    difficulty: Some(Difficulty::Medium),
    alertness_rating: 3,
  }
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('users', 'sleep_entries', 'test_results')",
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 3, "Expected 3 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let entry = mock_new_sleep_entry(1, day(2023, 3, 27), 8.0, 4.0);
    assert!(entry.wake_time > entry.bed_time);
    assert_eq!(entry.wake_time.date(), day(2023, 3, 28));

    let result = mock_new_test_result(1, day(2023, 3, 27).and_hms_opt(9, 0, 0).unwrap(), 60);
    assert_eq!(crate::scoring::score_answers(&result.questions, 20), 60);
  }
}
