use super::CommandError;
use crate::models::{CurrentUser, Difficulty, NewTestResult, QuestionSnapshot, TestResult};
use crate::scoring::{adjust_score_for_difficulty, score_answers};
use crate::store::Store;
use chrono::NaiveDateTime;
use serde::Deserialize;

/// Points per correct answer in a live test
pub const POINTS_PER_QUESTION: u32 = 1;

/// A completed test as submitted by a student
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestAttempt {
  pub start_time: NaiveDateTime,
  pub end_time: NaiveDateTime,
  pub questions: Vec<QuestionSnapshot>,
  #[serde(default)]
  pub difficulty: Option<Difficulty>,
  /// Self-reported, 1-5
  pub alertness_rating: i64,
}

impl TestAttempt {
  fn validate(&self) -> Result<(), CommandError> {
    if self.questions.is_empty() {
      return Err(CommandError::InvalidInput("a test needs at least one question".into()));
    }
    if self.end_time < self.start_time {
      return Err(CommandError::InvalidInput("test ends before it starts".into()));
    }
    if !(1..=5).contains(&self.alertness_rating) {
      return Err(CommandError::InvalidInput(format!(
        "alertness rating {} not in 1-5",
        self.alertness_rating
      )));
    }
    Ok(())
  }
}

/// Score an attempt and store it, replacing any result `user` already has on
/// the same calendar day
pub async fn submit_test<S: Store>(
  store: &S,
  user: &CurrentUser,
  attempt: TestAttempt,
) -> Result<TestResult, CommandError> {
  attempt.validate()?;

  let max = attempt.questions.len() as u32 * POINTS_PER_QUESTION;
  let score = score_answers(&attempt.questions, POINTS_PER_QUESTION);
  let adjusted = adjust_score_for_difficulty(score, attempt.difficulty, max);

  let result = store
    .replace_test_result_for_day(NewTestResult {
      user_id: user.id,
      start_time: attempt.start_time,
      end_time: attempt.end_time,
      questions: attempt.questions,
      score: score as i64,
      adjusted_score: Some(adjusted as i64),
      difficulty: attempt.difficulty,
      alertness_rating: attempt.alertness_rating,
    })
    .await?;

  tracing::info!(user_id = user.id, score = result.score, max, "Test result saved");
  Ok(result)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::SqliteStore;
  use crate::test_utils::*;
  use chrono::Duration;
  use serial_test::serial;

  fn attempt(correct: usize, total: usize, difficulty: Option<Difficulty>, hour: u32) -> TestAttempt {
    let start_time = day(2023, 3, 28).and_hms_opt(hour, 0, 0).unwrap();
    TestAttempt {
      start_time,
      end_time: start_time + Duration::minutes(12),
      questions: (0..total)
        .map(|i| QuestionSnapshot {
          question: format!("Q{}", i),
          options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
          user_answer: Some(if i < correct { "a".into() } else { "d".into() }),
          correct_answer: "a".into(),
          explanation: None,
        })
        .collect(),
      difficulty,
      alertness_rating: 4,
    }
  }

  #[tokio::test]
  #[serial]
  async fn test_submit_scores_and_adjusts() {
    let pool = setup_test_db().await;
    let store = SqliteStore::new(pool.clone());
    let user = store.insert_user(mock_new_student("nurlan@example.kz", 11)).await.unwrap();
    let current = CurrentUser::from(&user);

    let result = submit_test(&store, &current, attempt(4, 5, Some(Difficulty::Hard), 9)).await.unwrap();
    assert_eq!(result.score, 4);
    // 4 x 1.2 = 4.8, capped at 5
    assert_eq!(result.adjusted_score, Some(5));
    assert_eq!(result.alertness_rating, 4);
    assert_eq!(result.questions.len(), 5);

    let easy = submit_test(&store, &current, attempt(5, 5, Some(Difficulty::Easy), 14)).await.unwrap();
    assert_eq!(easy.score, 5);
    assert_eq!(easy.adjusted_score, Some(4));

    // The afternoon attempt replaced the morning one
    let stored = store.test_results_for_user(user.id, None).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].difficulty, Some(Difficulty::Easy));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_submit_rejects_bad_attempts() {
    let pool = setup_test_db().await;
    let store = SqliteStore::new(pool.clone());
    let user = store.insert_user(mock_new_student("nurlan@example.kz", 11)).await.unwrap();
    let current = CurrentUser::from(&user);

    let empty = attempt(0, 0, None, 9);
    assert!(matches!(submit_test(&store, &current, empty).await, Err(CommandError::InvalidInput(_))));

    let mut sleepy = attempt(1, 3, None, 9);
    sleepy.alertness_rating = 0;
    assert!(matches!(submit_test(&store, &current, sleepy).await, Err(CommandError::InvalidInput(_))));

    assert!(store.test_results_for_user(user.id, None).await.unwrap().is_empty());

    teardown_test_db(pool).await;
  }
}
