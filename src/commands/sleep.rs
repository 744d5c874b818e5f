use super::CommandError;
use crate::models::{CurrentUser, NewSleepEntry, SleepEntry};
use crate::scoring::{sleep_duration_hours, sleep_window};
use crate::store::Store;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

/// A night as reported by a student
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepForm {
  pub date: NaiveDate,
  pub bed_time: NaiveTime,
  pub wake_time: NaiveTime,
  pub sleep_quality: f64,
  #[serde(default)]
  pub screen_time: f64,
  #[serde(default)]
  pub caffeine_intake: i64,
  #[serde(default = "default_stress")]
  pub stress_level: f64,
  #[serde(default)]
  pub notes: Option<String>,
}

fn default_stress() -> f64 {
  3.0
}

impl SleepForm {
  fn validate(&self) -> Result<(), CommandError> {
    if !(1.0..=5.0).contains(&self.sleep_quality) {
      return Err(CommandError::InvalidInput(format!("sleep quality {} not in 1-5", self.sleep_quality)));
    }
    if !(1.0..=5.0).contains(&self.stress_level) {
      return Err(CommandError::InvalidInput(format!("stress level {} not in 1-5", self.stress_level)));
    }
    if self.screen_time < 0.0 || self.caffeine_intake < 0 {
      return Err(CommandError::InvalidInput("screen time and caffeine must not be negative".into()));
    }
    Ok(())
  }
}

/// Record a night for `user`, replacing any entry already logged for that date
pub async fn submit_sleep_entry<S: Store>(
  store: &S,
  user: &CurrentUser,
  form: SleepForm,
) -> Result<SleepEntry, CommandError> {
  form.validate()?;

  let (bed_time, wake_time) = sleep_window(form.date, form.bed_time, form.wake_time);
  let sleep_duration = sleep_duration_hours(bed_time, wake_time);

  let entry = store
    .upsert_sleep_entry(NewSleepEntry {
      user_id: user.id,
      date: form.date,
      bed_time,
      wake_time,
      sleep_duration,
      sleep_quality: form.sleep_quality,
      screen_time: form.screen_time,
      caffeine_intake: form.caffeine_intake,
      stress_level: form.stress_level,
      notes: form.notes,
    })
    .await?;

  tracing::info!(user_id = user.id, date = %entry.date, hours = entry.sleep_duration, "Sleep entry saved");
  Ok(entry)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::SqliteStore;
  use crate::test_utils::*;
  use serial_test::serial;

  fn form(bed: (u32, u32), wake: (u32, u32), quality: f64) -> SleepForm {
    SleepForm {
      date: day(2023, 3, 27),
      bed_time: NaiveTime::from_hms_opt(bed.0, bed.1, 0).unwrap(),
      wake_time: NaiveTime::from_hms_opt(wake.0, wake.1, 0).unwrap(),
      sleep_quality: quality,
      screen_time: 2.5,
      caffeine_intake: 120,
      stress_level: 3.0,
      notes: None,
    }
  }

  #[tokio::test]
  #[serial]
  async fn test_submit_rolls_over_midnight_and_replaces() {
    let pool = setup_test_db().await;
    let store = SqliteStore::new(pool.clone());
    let user = store.insert_user(mock_new_student("dana@example.kz", 9)).await.unwrap();
    let current = CurrentUser::from(&user);

    let first = submit_sleep_entry(&store, &current, form((22, 30), (6, 45), 4.0)).await.unwrap();
    assert_eq!(first.sleep_duration, 8.3);
    assert_eq!(first.wake_time.date(), day(2023, 3, 28));

    // Same night resubmitted
    let second = submit_sleep_entry(&store, &current, form((23, 0), (7, 0), 2.0)).await.unwrap();
    assert_eq!(second.sleep_duration, 8.0);

    let entries = store.sleep_entries_for_user(user.id, None).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].sleep_quality, 2.0);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_submit_rejects_out_of_range_quality() {
    let pool = setup_test_db().await;
    let store = SqliteStore::new(pool.clone());
    let user = store.insert_user(mock_new_student("dana@example.kz", 9)).await.unwrap();

    let result = submit_sleep_entry(&store, &CurrentUser::from(&user), form((22, 0), (6, 0), 7.0)).await;
    assert!(matches!(result, Err(CommandError::InvalidInput(_))));
    assert!(store.sleep_entries_for_user(user.id, None).await.unwrap().is_empty());

    teardown_test_db(pool).await;
  }
}
