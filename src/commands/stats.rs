use super::CommandError;
use crate::analytics::{
  cohort_averages, compute_difficulty_stats, parse_records, DashboardStats, DifficultyStats, ScoreBasis, SleepSample,
  StudentAverages, TestSample, TimeRange,
};
use crate::models::CurrentUser;
use crate::store::Store;
use crate::timestamp::RawId;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;

/// ---------------------------------------------------------------------------
/// Student Dashboard
/// ---------------------------------------------------------------------------

/// Dashboard for one student. Sleep entries and test results load
/// concurrently; if one fetch fails the other is still charted.
pub async fn student_dashboard<S: Store>(
  store: &S,
  user: &CurrentUser,
  range: TimeRange,
  today: NaiveDate,
) -> DashboardStats {
  let since = range.since(today);

  let (sleep, tests) = tokio::join!(
    store.sleep_entries_for_user(user.id, since),
    store.test_results_for_user(user.id, since),
  );

  let sleep = sleep.unwrap_or_else(|e| {
    tracing::error!(user_id = user.id, "Failed to load sleep entries: {}", e);
    Vec::new()
  });
  let tests = tests.unwrap_or_else(|e| {
    tracing::error!(user_id = user.id, "Failed to load test results: {}", e);
    Vec::new()
  });

  let sleep: Vec<SleepSample> = sleep.iter().map(SleepSample::from).collect();
  let tests: Vec<TestSample> = tests.iter().map(TestSample::from).collect();

  tracing::debug!(sleep = sleep.len(), tests = tests.len(), "Computing dashboard");
  DashboardStats::compute(&sleep, &tests)
}

/// Dashboard computed from a JSON export directory (`sleep-entries.json`,
/// `test-results.json`), optionally narrowed to one user id
pub fn dashboard_from_export(dir: &Path, user: Option<&RawId>) -> Result<DashboardStats, CommandError> {
  let sleep_raw = std::fs::read_to_string(dir.join("sleep-entries.json"))?;
  let tests_raw = std::fs::read_to_string(dir.join("test-results.json"))?;

  let mut sleep: Vec<SleepSample> = parse_records(&sleep_raw)?;
  let mut tests: Vec<TestSample> = parse_records(&tests_raw)?;

  if let Some(id) = user {
    sleep.retain(|s| s.user_id.as_ref() == Some(id));
    tests.retain(|t| t.user_id.as_ref() == Some(id));
  }

  Ok(DashboardStats::compute(&sleep, &tests))
}

/// ---------------------------------------------------------------------------
/// Cohort (teacher view)
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortReport {
  pub students: Vec<StudentAverages>,
  /// Adjusted-score averages per difficulty across the cohort
  pub difficulty: DifficultyStats,
}

pub async fn cohort_report<S: Store>(
  store: &S,
  range: TimeRange,
  today: NaiveDate,
) -> Result<CohortReport, CommandError> {
  let since = range.since(today);

  let (students, sleep, tests) = tokio::join!(
    store.list_students(),
    store.sleep_entries_since(since),
    store.test_results_since(since),
  );
  let students = students?;

  let sleep = sleep.unwrap_or_else(|e| {
    tracing::error!("Failed to load sleep entries: {}", e);
    Vec::new()
  });
  let tests = tests.unwrap_or_else(|e| {
    tracing::error!("Failed to load test results: {}", e);
    Vec::new()
  });

  let samples: Vec<TestSample> = tests.iter().map(TestSample::from).collect();

  Ok(CohortReport {
    students: cohort_averages(&students, &sleep, &tests),
    difficulty: compute_difficulty_stats(&samples, ScoreBasis::Adjusted),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::assert_approx_eq;
  use crate::store::{MemoryStore, SqliteStore};
  use crate::test_utils::*;
  use serial_test::serial;

  #[tokio::test]
  #[serial]
  async fn test_student_dashboard_respects_range() {
    let pool = setup_test_db().await;
    let store = SqliteStore::new(pool.clone());
    let user = store.insert_user(mock_new_student("aigerim@example.kz", 10)).await.unwrap();

    for (d, duration, score) in [(20, 6.0, 40), (27, 7.0, 60), (28, 8.0, 80), (29, 9.0, 100)] {
      let date = day(2023, 3, d);
      store.insert_sleep_entry(mock_new_sleep_entry(user.id, date, duration, 3.0)).await.unwrap();
      store
        .insert_test_result(mock_new_test_result(user.id, date.and_hms_opt(9, 0, 0).unwrap(), score))
        .await
        .unwrap();
    }

    let current = CurrentUser::from(&user);
    let week = student_dashboard(&store, &current, TimeRange::Week, day(2023, 3, 31)).await;
    assert!(week.has_data);
    assert_eq!(week.rows.len(), 3);
    assert_eq!(week.rows[0].date, "2023-03-27");
    assert_approx_eq!(week.averages.test_score, 80.0, 1e-9);
    assert_approx_eq!(week.correlations[0].correlation, 1.0, 1e-9);

    let all = student_dashboard(&store, &current, TimeRange::All, day(2023, 3, 31)).await;
    assert_eq!(all.rows.len(), 4);
    assert_eq!(all.difficulty.medium.count, 4);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_student_dashboard_without_data() {
    let store = MemoryStore::new();
    let user = store.insert_user(mock_new_student("empty@example.kz", 9)).await.unwrap();

    let stats = student_dashboard(&store, &CurrentUser::from(&user), TimeRange::Month, day(2023, 4, 1)).await;
    assert!(!stats.has_data);
    assert!(stats.rows.is_empty());
  }

  #[tokio::test]
  async fn test_cohort_report() {
    let store = MemoryStore::new();
    let a = store.insert_user(mock_new_student("a@example.kz", 9)).await.unwrap();
    let b = store.insert_user(mock_new_student("b@example.kz", 12)).await.unwrap();

    store.insert_sleep_entry(mock_new_sleep_entry(a.id, day(2023, 3, 27), 8.0, 4.0)).await.unwrap();
    store.insert_sleep_entry(mock_new_sleep_entry(b.id, day(2023, 3, 27), 6.0, 2.0)).await.unwrap();
    store
      .insert_test_result(mock_new_test_result(a.id, day(2023, 3, 27).and_hms_opt(9, 0, 0).unwrap(), 80))
      .await
      .unwrap();

    let report = cohort_report(&store, TimeRange::All, day(2023, 3, 31)).await.unwrap();
    assert_eq!(report.students.len(), 2);

    let first = report.students.iter().find(|s| s.user_id == a.id).unwrap();
    assert_approx_eq!(first.avg_sleep, 8.0, 1e-9);
    assert_approx_eq!(first.avg_score, 80.0, 1e-9);

    let second = report.students.iter().find(|s| s.user_id == b.id).unwrap();
    assert_eq!(second.avg_score, 0.0);
    assert_eq!(report.difficulty.medium.count, 1);
  }

  #[tokio::test]
  async fn test_dashboard_from_export_round_trip() {
    let store = MemoryStore::new();
    let a = store.insert_user(mock_new_student("a@example.kz", 10)).await.unwrap();
    let b = store.insert_user(mock_new_student("b@example.kz", 10)).await.unwrap();
    for (user, d) in [(a.id, 27), (a.id, 28), (b.id, 27)] {
      let date = day(2023, 3, d);
      store.insert_sleep_entry(mock_new_sleep_entry(user, date, 7.5, 3.0)).await.unwrap();
      store
        .insert_test_result(mock_new_test_result(user, date.and_hms_opt(10, 0, 0).unwrap(), 60))
        .await
        .unwrap();
    }

    let dir = std::env::temp_dir().join(format!("sleepy-dashboard-export-{}", std::process::id()));
    store.export_json(&dir).await.unwrap();

    let everyone = dashboard_from_export(&dir, None).unwrap();
    assert_eq!(everyone.rows.len(), 2);
    assert_eq!(everyone.difficulty.medium.count, 3);

    let only_a = dashboard_from_export(&dir, Some(&RawId::from(a.id))).unwrap();
    assert_eq!(only_a.difficulty.medium.count, 2);
    assert_eq!(only_a.rows[1].sleep_duration, 7.5);

    std::fs::remove_dir_all(&dir).ok();
  }
}
