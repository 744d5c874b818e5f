//! Deterministic analytics layer for sleep and test data
//!
//! Joins sleep entries and test results by calendar day and computes the
//! aggregates the dashboards chart: averages, factor/score correlations and
//! per-difficulty score summaries. Everything here is pure.

use crate::models::{Difficulty, SleepEntry, TestResult, User};
use crate::scoring::sleep_duration_hours;
use crate::timestamp::{RawId, RawTimestamp};
use chrono::{Months, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// ---------------------------------------------------------------------------
/// Input Samples
/// ---------------------------------------------------------------------------

/// A sleep entry as the analytics engine sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepSample {
  #[serde(default)]
  pub user_id: Option<RawId>,
  pub date: RawTimestamp,
  #[serde(default)]
  pub sleep_duration: f64,
  #[serde(default)]
  pub sleep_quality: f64,
  #[serde(default)]
  pub screen_time: f64,
  #[serde(default)]
  pub caffeine_intake: f64,
  #[serde(default)]
  pub stress_level: f64,
}

impl From<&SleepEntry> for SleepSample {
  fn from(e: &SleepEntry) -> Self {
    Self {
      user_id: Some(RawId::from(e.user_id)),
      date: RawTimestamp::from(e.date),
      sleep_duration: e.sleep_duration,
      sleep_quality: e.sleep_quality,
      screen_time: e.screen_time,
      caffeine_intake: e.caffeine_intake as f64,
      stress_level: e.stress_level,
    }
  }
}

/// A test result as the analytics engine sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSample {
  #[serde(default)]
  pub user_id: Option<RawId>,
  pub start_time: RawTimestamp,
  #[serde(default)]
  pub score: f64,
  #[serde(default)]
  pub adjusted_score: Option<f64>,
  #[serde(default, deserialize_with = "lenient_difficulty")]
  pub difficulty: Option<Difficulty>,
  #[serde(default)]
  pub alertness_rating: f64,
}

impl From<&TestResult> for TestSample {
  fn from(t: &TestResult) -> Self {
    Self {
      user_id: Some(RawId::from(t.user_id)),
      start_time: RawTimestamp::from(t.start_time),
      score: t.score as f64,
      adjusted_score: t.adjusted_score.map(|s| s as f64),
      difficulty: t.difficulty,
      alertness_rating: t.alertness_rating as f64,
    }
  }
}

/// Unknown or missing labels become `None` instead of failing the record
fn lenient_difficulty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Difficulty>, D::Error> {
  let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
  Ok(value.as_ref().and_then(serde_json::Value::as_str).and_then(Difficulty::parse_label))
}

/// Parse a JSON array of records, dropping (and logging) the ones that don't fit
pub fn parse_records<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, serde_json::Error> {
  let values: Vec<serde_json::Value> = serde_json::from_str(raw)?;
  let total = values.len();

  let records: Vec<T> = values
    .into_iter()
    .enumerate()
    .filter_map(|(i, value)| match serde_json::from_value(value) {
      Ok(record) => Some(record),
      Err(e) => {
        tracing::warn!(index = i, "Skipping malformed record: {}", e);
        None
      }
    })
    .collect();

  if records.len() < total {
    tracing::warn!("Dropped {} of {} records", total - records.len(), total);
  }

  Ok(records)
}

/// ---------------------------------------------------------------------------
/// Daily Rows
/// ---------------------------------------------------------------------------

/// One calendar day of joined sleep and test data
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRow {
  /// YYYY-MM-DD
  pub date: String,
  pub test_score: f64,
  pub sleep_duration: f64,
  pub sleep_quality: f64,
  pub alertness: f64,
  pub screen_time: f64,
  pub caffeine_intake: f64,
  pub stress_level: f64,
  pub difficulty: DifficultyBucket,
}

impl StatsRow {
  fn empty(date: String) -> Self {
    Self {
      date,
      test_score: 0.0,
      sleep_duration: 0.0,
      sleep_quality: 0.0,
      alertness: 0.0,
      screen_time: 0.0,
      caffeine_intake: 0.0,
      stress_level: 0.0,
      difficulty: DifficultyBucket::Unknown,
    }
  }
}

/// Join records by calendar day, ascending. A later record for the same day
/// overwrites the fields it carries. Records with unreadable dates are skipped.
pub fn join_by_date(sleep: &[SleepSample], tests: &[TestSample]) -> Vec<StatsRow> {
  let mut days: BTreeMap<String, StatsRow> = BTreeMap::new();

  for test in tests {
    let key = match test.start_time.day_string() {
      Ok(key) => key,
      Err(e) => {
        tracing::warn!("Skipping test result: {}", e);
        continue;
      }
    };
    let row = days.entry(key.clone()).or_insert_with(|| StatsRow::empty(key));
    row.test_score = test.score;
    row.alertness = test.alertness_rating;
    row.difficulty = DifficultyBucket::from(test.difficulty);
  }

  for entry in sleep {
    let key = match entry.date.day_string() {
      Ok(key) => key,
      Err(e) => {
        tracing::warn!("Skipping sleep entry: {}", e);
        continue;
      }
    };
    let row = days.entry(key.clone()).or_insert_with(|| StatsRow::empty(key));
    row.sleep_duration = entry.sleep_duration;
    row.sleep_quality = entry.sleep_quality;
    row.screen_time = entry.screen_time;
    row.caffeine_intake = entry.caffeine_intake;
    row.stress_level = entry.stress_level;
  }

  days.into_values().collect()
}

/// ---------------------------------------------------------------------------
/// Averages
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageSet {
  pub test_score: f64,
  pub sleep_duration: f64,
  pub sleep_quality: f64,
  pub alertness: f64,
  pub screen_time: f64,
  pub caffeine_intake: f64,
  pub stress_level: f64,
}

/// Per-field means; all zero for no rows
pub fn compute_averages(rows: &[StatsRow]) -> AverageSet {
  if rows.is_empty() {
    return AverageSet::default();
  }

  let n = rows.len() as f64;
  let mean = |f: fn(&StatsRow) -> f64| rows.iter().map(f).sum::<f64>() / n;

  AverageSet {
    test_score: mean(|r| r.test_score),
    sleep_duration: mean(|r| r.sleep_duration),
    sleep_quality: mean(|r| r.sleep_quality),
    alertness: mean(|r| r.alertness),
    screen_time: mean(|r| r.screen_time),
    caffeine_intake: mean(|r| r.caffeine_intake),
    stress_level: mean(|r| r.stress_level),
  }
}

/// ---------------------------------------------------------------------------
/// Correlations
/// ---------------------------------------------------------------------------

/// Pearson correlation coefficient. 0 for mismatched lengths, fewer than two
/// pairs, or zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
  let n = x.len();
  if n != y.len() || n < 2 {
    return 0.0;
  }

  let nf = n as f64;
  let sum_x: f64 = x.iter().sum();
  let sum_y: f64 = y.iter().sum();
  let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
  let sum_x2: f64 = x.iter().map(|a| a * a).sum();
  let sum_y2: f64 = y.iter().map(|b| b * b).sum();

  let numerator = nf * sum_xy - sum_x * sum_y;
  let denominator = ((nf * sum_x2 - sum_x * sum_x) * (nf * sum_y2 - sum_y * sum_y)).sqrt();

  if denominator == 0.0 || denominator.is_nan() {
    0.0
  } else {
    numerator / denominator
  }
}

/// Sleep-side factors correlated against test score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Factor {
  SleepDuration,
  SleepQuality,
  Alertness,
  ScreenTime,
  CaffeineIntake,
  StressLevel,
}

impl Factor {
  pub const ALL: [Factor; 6] = [
    Factor::SleepDuration,
    Factor::SleepQuality,
    Factor::Alertness,
    Factor::ScreenTime,
    Factor::CaffeineIntake,
    Factor::StressLevel,
  ];

  pub fn value(&self, row: &StatsRow) -> f64 {
    match self {
      Factor::SleepDuration => row.sleep_duration,
      Factor::SleepQuality => row.sleep_quality,
      Factor::Alertness => row.alertness,
      Factor::ScreenTime => row.screen_time,
      Factor::CaffeineIntake => row.caffeine_intake,
      Factor::StressLevel => row.stress_level,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Factor::SleepDuration => "Sleep Duration",
      Factor::SleepQuality => "Sleep Quality",
      Factor::Alertness => "Alertness",
      Factor::ScreenTime => "Screen Time",
      Factor::CaffeineIntake => "Caffeine Intake",
      Factor::StressLevel => "Stress Level",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
  StrongPositive,
  ModeratePositive,
  WeakPositive,
  Neutral,
  WeakNegative,
  ModerateNegative,
  StrongNegative,
}

impl CorrelationStrength {
  /// Chart color
  pub fn color(&self) -> &'static str {
    match self {
      CorrelationStrength::StrongPositive => "#4caf50",
      CorrelationStrength::ModeratePositive => "#8bc34a",
      CorrelationStrength::WeakPositive => "#cddc39",
      CorrelationStrength::Neutral => "#9e9e9e",
      CorrelationStrength::WeakNegative => "#ffeb3b",
      CorrelationStrength::ModerateNegative => "#ff9800",
      CorrelationStrength::StrongNegative => "#f44336",
    }
  }
}

/// |r| > 0.7 strong, > 0.5 moderate, > 0.3 weak, otherwise neutral
pub fn classify_correlation_strength(r: f64) -> CorrelationStrength {
  let positive = r > 0.0;
  let magnitude = r.abs();

  if magnitude > 0.7 {
    if positive { CorrelationStrength::StrongPositive } else { CorrelationStrength::StrongNegative }
  } else if magnitude > 0.5 {
    if positive { CorrelationStrength::ModeratePositive } else { CorrelationStrength::ModerateNegative }
  } else if magnitude > 0.3 {
    if positive { CorrelationStrength::WeakPositive } else { CorrelationStrength::WeakNegative }
  } else {
    CorrelationStrength::Neutral
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Correlation {
  pub factor: Factor,
  pub correlation: f64,
  pub strength: CorrelationStrength,
  pub color: &'static str,
  /// Days where both the factor and the score were nonzero
  pub pairs: usize,
}

/// Correlate every factor with test score over days where both are nonzero,
/// strongest first. Fewer than two rows yields nothing.
pub fn compute_correlations(rows: &[StatsRow]) -> Vec<Correlation> {
  if rows.len() < 2 {
    return Vec::new();
  }

  let mut correlations: Vec<Correlation> = Factor::ALL
    .iter()
    .map(|&factor| {
      let (x, y): (Vec<f64>, Vec<f64>) = rows
        .iter()
        .filter(|r| r.test_score != 0.0 && factor.value(r) != 0.0)
        .map(|r| (factor.value(r), r.test_score))
        .unzip();

      let r = pearson(&x, &y);
      let strength = classify_correlation_strength(r);
      Correlation {
        factor,
        correlation: r,
        strength,
        color: strength.color(),
        pairs: x.len(),
      }
    })
    .collect();

  // Stable: equal magnitudes keep factor order
  correlations.sort_by(|a, b| b.correlation.abs().total_cmp(&a.correlation.abs()));
  correlations
}

/// ---------------------------------------------------------------------------
/// Difficulty Stats
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyBucket {
  Easy,
  Medium,
  Hard,
  Unknown,
}

impl From<Option<Difficulty>> for DifficultyBucket {
  fn from(d: Option<Difficulty>) -> Self {
    match d {
      Some(Difficulty::Easy) => DifficultyBucket::Easy,
      Some(Difficulty::Medium) => DifficultyBucket::Medium,
      Some(Difficulty::Hard) => DifficultyBucket::Hard,
      None => DifficultyBucket::Unknown,
    }
  }
}

/// Which score a summary averages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreBasis {
  #[default]
  Raw,
  /// Adjusted score, falling back to raw when absent
  Adjusted,
}

impl ScoreBasis {
  fn score(&self, test: &TestSample) -> f64 {
    match self {
      ScoreBasis::Raw => test.score,
      ScoreBasis::Adjusted => test.adjusted_score.unwrap_or(test.score),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketStats {
  pub count: usize,
  pub avg_score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DifficultyStats {
  pub easy: BucketStats,
  pub medium: BucketStats,
  pub hard: BucketStats,
  pub unknown: BucketStats,
}

impl DifficultyStats {
  fn bucket_mut(&mut self, bucket: DifficultyBucket) -> &mut BucketStats {
    match bucket {
      DifficultyBucket::Easy => &mut self.easy,
      DifficultyBucket::Medium => &mut self.medium,
      DifficultyBucket::Hard => &mut self.hard,
      DifficultyBucket::Unknown => &mut self.unknown,
    }
  }
}

/// Count and mean score of tests per difficulty
pub fn compute_difficulty_stats(tests: &[TestSample], basis: ScoreBasis) -> DifficultyStats {
  let mut stats = DifficultyStats::default();

  for test in tests {
    let bucket = stats.bucket_mut(DifficultyBucket::from(test.difficulty));
    bucket.count += 1;
    bucket.avg_score += basis.score(test);
  }

  for bucket in [&mut stats.easy, &mut stats.medium, &mut stats.hard, &mut stats.unknown] {
    if bucket.count > 0 {
      bucket.avg_score /= bucket.count as f64;
    }
  }

  stats
}

/// ---------------------------------------------------------------------------
/// Time Range
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
  #[default]
  Week,
  Month,
  All,
}

impl TimeRange {
  /// Inclusive lower bound relative to `today`
  pub fn since(&self, today: NaiveDate) -> Option<NaiveDate> {
    match self {
      TimeRange::Week => Some(today - chrono::Duration::days(7)),
      TimeRange::Month => today.checked_sub_months(Months::new(1)),
      TimeRange::All => None,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Dashboard
/// ---------------------------------------------------------------------------

/// Everything the student dashboard shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
  pub rows: Vec<StatsRow>,
  pub averages: AverageSet,
  pub correlations: Vec<Correlation>,
  pub difficulty: DifficultyStats,
  pub has_data: bool,
}

impl DashboardStats {
  pub fn compute(sleep: &[SleepSample], tests: &[TestSample]) -> Self {
    let rows = join_by_date(sleep, tests);

    Self {
      averages: compute_averages(&rows),
      correlations: compute_correlations(&rows),
      difficulty: compute_difficulty_stats(tests, ScoreBasis::Raw),
      has_data: !rows.is_empty(),
      rows,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Cohort (teacher view)
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAverages {
  pub user_id: i64,
  pub name: String,
  /// Mean adjusted score (raw when no adjusted score was stored)
  pub avg_score: f64,
  /// Mean hours between bed and wake
  pub avg_sleep: f64,
  pub avg_quality: f64,
  pub tests: usize,
  pub nights: usize,
}

/// Per-student means for the teacher view
pub fn cohort_averages(students: &[User], sleep: &[SleepEntry], tests: &[TestResult]) -> Vec<StudentAverages> {
  fn mean(values: impl Iterator<Item = f64>) -> (f64, usize) {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { (0.0, 0) } else { (sum / n as f64, n) }
  }

  students
    .iter()
    .map(|student| {
      let own_tests = tests.iter().filter(|t| t.user_id == student.id);
      let own_sleep = || sleep.iter().filter(|e| e.user_id == student.id);

      let (avg_score, test_count) = mean(own_tests.map(|t| t.adjusted_score.unwrap_or(t.score) as f64));
      let (avg_sleep, nights) = mean(own_sleep().map(|e| sleep_duration_hours(e.bed_time, e.wake_time)));
      let (avg_quality, _) = mean(own_sleep().map(|e| e.sleep_quality));

      StudentAverages {
        user_id: student.id,
        name: student.name.clone(),
        avg_score,
        avg_sleep,
        avg_quality,
        tests: test_count,
        nights,
      }
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
