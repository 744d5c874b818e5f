use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SleepEntry {
  pub id: i64,
  pub user_id: i64,
  /// The night being reported
  pub date: NaiveDate,
  pub bed_time: NaiveDateTime,
  pub wake_time: NaiveDateTime,
  /// Hours, one decimal
  pub sleep_duration: f64,
  /// 1-5
  pub sleep_quality: f64,
  /// Hours of screen use before bed
  pub screen_time: f64,
  /// mg
  pub caffeine_intake: i64,
  /// 1-5
  pub stress_level: f64,
  pub notes: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// For inserting new sleep entries (without id, created_at)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSleepEntry {
  pub user_id: i64,
  pub date: NaiveDate,
  pub bed_time: NaiveDateTime,
  pub wake_time: NaiveDateTime,
  pub sleep_duration: f64,
  pub sleep_quality: f64,
  pub screen_time: f64,
  pub caffeine_intake: i64,
  pub stress_level: f64,
  pub notes: Option<String>,
}

impl NewSleepEntry {
  pub fn into_entry(self, id: i64, created_at: DateTime<Utc>) -> SleepEntry {
    SleepEntry {
      id,
      user_id: self.user_id,
      date: self.date,
      bed_time: self.bed_time,
      wake_time: self.wake_time,
      sleep_duration: self.sleep_duration,
      sleep_quality: self.sleep_quality,
      screen_time: self.screen_time,
      caffeine_intake: self.caffeine_intake,
      stress_level: self.stress_level,
      notes: self.notes,
      created_at,
    }
  }
}
