//! Scoring and derivation helpers shared by the generator, the live flows
//! and the analytics engine

use crate::models::{Difficulty, QuestionSnapshot};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Round to `places` decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
  let factor = 10f64.powi(places);
  (value * factor).round() / factor
}

/// ---------------------------------------------------------------------------
/// Sleep Window
/// ---------------------------------------------------------------------------

/// Anchor bed/wake clock times to the reported night. A wake clock time at or
/// before the bed clock time is taken to be on the following day.
pub fn sleep_window(date: NaiveDate, bed: NaiveTime, wake: NaiveTime) -> (NaiveDateTime, NaiveDateTime) {
  let bed_at = date.and_time(bed);
  let mut wake_at = date.and_time(wake);
  if wake_at <= bed_at {
    wake_at += Duration::days(1);
  }
  (bed_at, wake_at)
}

/// Hours between bed and wake (one decimal), rolling wake over midnight when
/// it reads earlier than bed
pub fn sleep_duration_hours(bed: NaiveDateTime, wake: NaiveDateTime) -> f64 {
  let mut wake = wake;
  if wake < bed {
    wake += Duration::days(1);
  }
  let minutes = (wake - bed).num_minutes() as f64;
  round_to(minutes / 60.0, 1)
}

/// ---------------------------------------------------------------------------
/// Alertness
/// ---------------------------------------------------------------------------

/// 1-10 rating from sleep quality (1-5) and duration (hours, saturating at 9)
pub fn alertness_from_sleep(quality: f64, duration: f64) -> u8 {
  let quality_part = quality / 5.0;
  let duration_part = (duration / 9.0).min(1.0);
  let raw = ((quality_part + duration_part) / 2.0 * 10.0).round();
  raw.clamp(1.0, 10.0) as u8
}

/// 1-5 rating from an expected performance (0-100)
pub fn alertness_from_performance(expected: f64) -> u8 {
  (expected / 20.0).round().clamp(1.0, 5.0) as u8
}

/// ---------------------------------------------------------------------------
/// Scores
/// ---------------------------------------------------------------------------

/// Weight a raw score by difficulty: easy x0.8, medium x1.0, hard x1.2 (never
/// above `max`). Unspecified difficulty is unweighted.
pub fn adjust_score_for_difficulty(raw: u32, difficulty: Option<Difficulty>, max: u32) -> u32 {
  let raw = raw as f64;
  let adjusted = match difficulty {
    Some(Difficulty::Easy) => raw * 0.8,
    Some(Difficulty::Medium) | None => raw,
    Some(Difficulty::Hard) => (raw * 1.2).min(max as f64),
  };
  adjusted.round() as u32
}

/// Points for every snapshot whose answer matches the correct answer
pub fn score_answers(snapshots: &[QuestionSnapshot], points_per_question: u32) -> u32 {
  snapshots.iter().filter(|q| q.is_correct()).count() as u32 * points_per_question
}
