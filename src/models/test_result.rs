use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Difficulty
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  /// Bucket an expected performance (0-100): >= 85 hard, >= 60 medium
  pub fn from_expected_performance(expected: f64) -> Self {
    if expected >= 85.0 {
      Difficulty::Hard
    } else if expected >= 60.0 {
      Difficulty::Medium
    } else {
      Difficulty::Easy
    }
  }

  /// Case-insensitive; anything unrecognized is unspecified
  pub fn parse_label(label: &str) -> Option<Self> {
    label.trim().to_lowercase().parse().ok()
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

impl std::fmt::Display for Difficulty {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for Difficulty {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "easy" => Ok(Self::Easy),
      "medium" => Ok(Self::Medium),
      "hard" => Ok(Self::Hard),
      _ => Err(format!("Unknown difficulty: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Question Snapshot
/// ---------------------------------------------------------------------------

/// A question as it was shown, plus the answer given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSnapshot {
  pub question: String,
  pub options: Vec<String>,
  pub user_answer: Option<String>,
  pub correct_answer: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub explanation: Option<String>,
}

impl QuestionSnapshot {
  pub fn is_correct(&self) -> bool {
    self.user_answer.as_deref() == Some(self.correct_answer.as_str())
  }
}

/// ---------------------------------------------------------------------------
/// Test Result
/// ---------------------------------------------------------------------------

pub const RESULT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
  pub id: i64,
  pub user_id: i64,
  pub start_time: NaiveDateTime,
  pub end_time: NaiveDateTime,
  pub questions: Vec<QuestionSnapshot>,
  pub score: i64,
  pub adjusted_score: Option<i64>,
  pub difficulty: Option<Difficulty>,
  pub alertness_rating: i64,
  pub version: String,
  pub created_at: DateTime<Utc>,
}

/// For inserting new test results (without id, created_at)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTestResult {
  pub user_id: i64,
  pub start_time: NaiveDateTime,
  pub end_time: NaiveDateTime,
  pub questions: Vec<QuestionSnapshot>,
  pub score: i64,
  pub adjusted_score: Option<i64>,
  pub difficulty: Option<Difficulty>,
  pub alertness_rating: i64,
}

impl NewTestResult {
  pub fn into_result(self, id: i64, created_at: DateTime<Utc>) -> TestResult {
    TestResult {
      id,
      user_id: self.user_id,
      start_time: self.start_time,
      end_time: self.end_time,
      questions: self.questions,
      score: self.score,
      adjusted_score: self.adjusted_score,
      difficulty: self.difficulty,
      alertness_rating: self.alertness_rating,
      version: RESULT_VERSION.to_string(),
      created_at,
    }
  }
}

/// Raw `test_results` row (questions stored as JSON text)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TestResultRow {
  pub id: i64,
  pub user_id: i64,
  pub start_time: NaiveDateTime,
  pub end_time: NaiveDateTime,
  pub questions_json: String,
  pub score: i64,
  pub adjusted_score: Option<i64>,
  pub difficulty: Option<String>,
  pub alertness_rating: i64,
  pub version: String,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<TestResultRow> for TestResult {
  type Error = serde_json::Error;

  fn try_from(row: TestResultRow) -> Result<Self, Self::Error> {
    Ok(TestResult {
      id: row.id,
      user_id: row.user_id,
      start_time: row.start_time,
      end_time: row.end_time,
      questions: serde_json::from_str(&row.questions_json)?,
      score: row.score,
      adjusted_score: row.adjusted_score,
      difficulty: row.difficulty.as_deref().and_then(Difficulty::parse_label),
      alertness_rating: row.alertness_rating,
      version: row.version,
      created_at: row.created_at,
    })
  }
}
