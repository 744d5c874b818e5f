use super::questions::QuestionBank;
use super::roster::RosterMember;
use super::sleep::{generate_sleep_entry, SleepModel};
use super::test::{generate_test_result, SleepFactors, TestModel};
use super::{is_weekend, GeneratorError};
use crate::models::User;
use crate::store::Store;
use chrono::{Duration, NaiveDate};
use rand::Rng;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Which night a test result is conditioned on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SleepSource {
  /// The entry dated the same day as the test
  #[default]
  SameDay,
  /// The entry dated the day before the test
  PreviousNight,
}

#[derive(Debug, Clone)]
pub struct SeedOptions {
  pub start: NaiveDate,
  /// Window length; the end date is `start + days`, inclusive
  pub days: i64,
  pub skip_existing: bool,
  pub create_users: bool,
  /// Pause after each write
  pub delay: std::time::Duration,
  pub sleep_source: SleepSource,
  pub sleep_model: SleepModel,
  pub test_model: TestModel,
}

impl Default for SeedOptions {
  fn default() -> Self {
    Self {
      start: NaiveDate::from_ymd_opt(2023, 3, 27).unwrap_or(NaiveDate::MIN),
      days: 30,
      skip_existing: true,
      create_users: true,
      delay: std::time::Duration::from_millis(100),
      sleep_source: SleepSource::SameDay,
      sleep_model: SleepModel::default(),
      test_model: TestModel::default(),
    }
  }
}

impl SeedOptions {
  pub fn end(&self) -> NaiveDate {
    self.start + Duration::days(self.days)
  }
}

/// ---------------------------------------------------------------------------
/// Summary
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
  pub inserted: usize,
  pub skipped: usize,
  pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
  pub users_created: usize,
  pub users_existing: usize,
  pub users_missing: usize,
  pub sleep_entries: RecordCounts,
  pub test_results: RecordCounts,
}

impl std::fmt::Display for SeedSummary {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    writeln!(
      f,
      "Users: {} created, {} existing, {} missing",
      self.users_created, self.users_existing, self.users_missing
    )?;
    writeln!(
      f,
      "Sleep entries: {} inserted, {} skipped, {} failed",
      self.sleep_entries.inserted, self.sleep_entries.skipped, self.sleep_entries.failed
    )?;
    write!(
      f,
      "Test results: {} inserted, {} skipped, {} failed",
      self.test_results.inserted, self.test_results.skipped, self.test_results.failed
    )
  }
}

/// ---------------------------------------------------------------------------
/// Date Helpers
/// ---------------------------------------------------------------------------

/// Every day from `start` to `end`, inclusive
pub fn days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
  start.iter_days().take_while(|d| *d <= end).collect()
}

/// Monday-Friday dates from `start` to `end`, inclusive
pub fn weekdays_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
  days_between(start, end).into_iter().filter(|d| !is_weekend(*d)).collect()
}

/// ---------------------------------------------------------------------------
/// Batch Runner
/// ---------------------------------------------------------------------------

/// Populate `store` with sleep entries for every day of the window and test
/// results for its weekdays, for each roster member.
///
/// Per-record failures are logged and counted; they never stop the run.
pub async fn seed<S: Store, R: Rng + ?Sized>(
  store: &S,
  roster: &[RosterMember],
  options: &SeedOptions,
  bank: &QuestionBank,
  rng: &mut R,
) -> SeedSummary {
  let mut summary = SeedSummary::default();
  let days = days_between(options.start, options.end());
  let test_days: HashSet<NaiveDate> = weekdays_between(options.start, options.end()).into_iter().collect();

  tracing::info!(
    users = roster.len(),
    start = %options.start,
    end = %options.end(),
    days = days.len(),
    "Seeding synthetic data"
  );

  for (i, member) in roster.iter().enumerate() {
    tracing::info!("Processing user {}/{}: {} ({})", i + 1, roster.len(), member.name, member.email);

    let Some(user) = ensure_user(store, member, options.create_users, &mut summary).await else {
      continue;
    };

    let mut nights: HashMap<NaiveDate, SleepFactors> = HashMap::new();

    for &date in &days {
      match seed_sleep_entry(store, &user, date, options, rng).await {
        Ok(SeedOutcome::Inserted(factors)) => {
          summary.sleep_entries.inserted += 1;
          nights.insert(date, factors);
        }
        Ok(SeedOutcome::Skipped(factors)) => {
          summary.sleep_entries.skipped += 1;
          nights.insert(date, factors);
        }
        Err(e) => {
          summary.sleep_entries.failed += 1;
          tracing::error!(user = %user.email, %date, "Failed to seed sleep entry: {}", e);
        }
      }

      if !test_days.contains(&date) {
        continue;
      }

      match seed_test_result(store, &user, date, &nights, options, bank, rng).await {
        Ok(SeedOutcome::Inserted(_)) => summary.test_results.inserted += 1,
        Ok(SeedOutcome::Skipped(_)) => summary.test_results.skipped += 1,
        Err(e) => {
          summary.test_results.failed += 1;
          tracing::error!(user = %user.email, %date, "Failed to seed test result: {}", e);
        }
      }
    }

    tracing::info!(user = %user.email, "Finished user");
  }

  tracing::info!(
    sleep_inserted = summary.sleep_entries.inserted,
    tests_inserted = summary.test_results.inserted,
    "Seeding complete"
  );

  summary
}

enum SeedOutcome {
  Inserted(SleepFactors),
  Skipped(SleepFactors),
}

async fn ensure_user<S: Store>(
  store: &S,
  member: &RosterMember,
  create: bool,
  summary: &mut SeedSummary,
) -> Option<User> {
  match store.find_user_by_email(member.email).await {
    Ok(Some(user)) => {
      summary.users_existing += 1;
      Some(user)
    }
    Ok(None) if create => match store.insert_user(member.to_new_user()).await {
      Ok(user) => {
        tracing::info!(email = %member.email, id = user.id, "Created user");
        summary.users_created += 1;
        Some(user)
      }
      Err(e) => {
        tracing::error!(email = %member.email, "Error creating user: {}", e);
        summary.users_missing += 1;
        None
      }
    },
    Ok(None) => {
      tracing::warn!(email = %member.email, "User not found, skipping");
      summary.users_missing += 1;
      None
    }
    Err(e) => {
      tracing::error!(email = %member.email, "Error looking up user: {}", e);
      summary.users_missing += 1;
      None
    }
  }
}

async fn seed_sleep_entry<S: Store, R: Rng + ?Sized>(
  store: &S,
  user: &User,
  date: NaiveDate,
  options: &SeedOptions,
  rng: &mut R,
) -> Result<SeedOutcome, GeneratorError> {
  if options.skip_existing {
    if let Some(existing) = store.find_sleep_entry(user.id, date).await? {
      return Ok(SeedOutcome::Skipped(SleepFactors::from(&existing)));
    }
  }

  let entry = generate_sleep_entry(user, date, &options.sleep_model, rng);
  let factors = SleepFactors::from(&entry);
  store.insert_sleep_entry(entry).await?;
  throttle(options.delay).await;

  Ok(SeedOutcome::Inserted(factors))
}

async fn seed_test_result<S: Store, R: Rng + ?Sized>(
  store: &S,
  user: &User,
  date: NaiveDate,
  nights: &HashMap<NaiveDate, SleepFactors>,
  options: &SeedOptions,
  bank: &QuestionBank,
  rng: &mut R,
) -> Result<SeedOutcome, GeneratorError> {
  if options.skip_existing && store.find_test_result(user.id, date).await?.is_some() {
    return Ok(SeedOutcome::Skipped(SleepFactors::NEUTRAL));
  }

  let night = match options.sleep_source {
    SleepSource::SameDay => date,
    SleepSource::PreviousNight => date - Duration::days(1),
  };
  let factors = match nights.get(&night) {
    Some(f) => *f,
    None => store
      .find_sleep_entry(user.id, night)
      .await?
      .map(|e| SleepFactors::from(&e))
      .unwrap_or(SleepFactors::NEUTRAL),
  };

  let generated = generate_test_result(user, date, &factors, &options.test_model, bank, rng)?;
  tracing::debug!(
    user = %user.email,
    %date,
    expected = generated.expected_performance,
    "Generated test result"
  );
  store.insert_test_result(generated.result).await?;
  throttle(options.delay).await;

  Ok(SeedOutcome::Inserted(factors))
}

async fn throttle(delay: std::time::Duration) {
  if !delay.is_zero() {
    tokio::time::sleep(delay).await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::generator::KAZAKH_ROSTER;
  use crate::store::{MemoryStore, SqliteStore};
  use crate::test_utils::*;
  use chrono::Datelike;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn fast_options(days: i64) -> SeedOptions {
    SeedOptions {
      days,
      delay: std::time::Duration::ZERO,
      ..SeedOptions::default()
    }
  }

  #[test]
  fn test_weekdays_between() {
    // Mon 2023-03-27 .. Mon 2023-04-10
    let days = weekdays_between(day(2023, 3, 27), day(2023, 4, 10));
    assert_eq!(days.len(), 11);
    assert!(days.iter().all(|d| d.weekday().number_from_monday() <= 5));
    assert_eq!(days.first(), Some(&day(2023, 3, 27)));
    assert_eq!(days.last(), Some(&day(2023, 4, 10)));

    assert!(weekdays_between(day(2023, 4, 1), day(2023, 4, 2)).is_empty());
    assert!(weekdays_between(day(2023, 4, 10), day(2023, 4, 1)).is_empty());
  }

  #[tokio::test]
  async fn test_default_window_counts() {
    let store = MemoryStore::new();
    let mut rng = StdRng::seed_from_u64(2023);
    let options = fast_options(30);

    let summary = seed(&store, &KAZAKH_ROSTER[..2], &options, &QuestionBank::builtin(), &mut rng).await;

    // 2023-03-27 .. 2023-04-26: 31 days, 23 weekdays
    assert_eq!(summary.users_created, 2);
    assert_eq!(summary.sleep_entries.inserted, 62);
    assert_eq!(summary.test_results.inserted, 46);
    assert_eq!(summary.sleep_entries.failed + summary.test_results.failed, 0);

    let results = store.test_results_since(None).await.unwrap();
    assert!(results.iter().all(|r| r.start_time.weekday().number_from_monday() <= 5));
  }

  #[tokio::test]
  async fn test_skip_existing_is_idempotent() {
    let pool = setup_test_db().await;
    let store = SqliteStore::new(pool.clone());
    let options = fast_options(6);
    let roster = &KAZAKH_ROSTER[..1];

    let first = seed(&store, roster, &options, &QuestionBank::builtin(), &mut StdRng::seed_from_u64(1)).await;
    let second = seed(&store, roster, &options, &QuestionBank::builtin(), &mut StdRng::seed_from_u64(2)).await;

    assert_eq!(first.sleep_entries.inserted, 7);
    assert_eq!(first.test_results.inserted, 5);
    assert_eq!(second.users_existing, 1);
    assert_eq!(second.sleep_entries.inserted, 0);
    assert_eq!(second.sleep_entries.skipped, 7);
    assert_eq!(second.test_results.skipped, 5);

    assert_eq!(store.sleep_entries_since(None).await.unwrap().len(), 7);
    assert_eq!(store.test_results_since(None).await.unwrap().len(), 5);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_missing_users_are_skipped_without_creation() {
    let store = MemoryStore::new();
    let options = SeedOptions {
      create_users: false,
      ..fast_options(3)
    };

    let summary = seed(&store, &KAZAKH_ROSTER[..3], &options, &QuestionBank::builtin(), &mut StdRng::seed_from_u64(4)).await;
    assert_eq!(summary.users_missing, 3);
    assert_eq!(summary.sleep_entries, RecordCounts::default());
    assert!(store.sleep_entries_since(None).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_empty_bank_counts_failures_and_continues() {
    let store = MemoryStore::new();
    let options = SeedOptions {
      sleep_source: SleepSource::PreviousNight,
      ..fast_options(2)
    };
    let bank = QuestionBank::new(vec![], vec![], vec![]);

    let summary = seed(&store, &KAZAKH_ROSTER[..1], &options, &bank, &mut StdRng::seed_from_u64(8)).await;
    assert_eq!(summary.sleep_entries.inserted, 3);
    assert_eq!(summary.test_results.failed, 3);
    assert_eq!(summary.test_results.inserted, 0);
  }

  #[test]
  fn test_summary_display() {
    let summary = SeedSummary {
      users_created: 2,
      sleep_entries: RecordCounts { inserted: 10, skipped: 1, failed: 0 },
      ..SeedSummary::default()
    };
    let text = summary.to_string();
    assert!(text.contains("2 created"));
    assert!(text.contains("Sleep entries: 10 inserted, 1 skipped, 0 failed"));
  }
}
