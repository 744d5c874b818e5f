use super::{Store, StoreError};
use crate::db::DbPool;
use crate::models::{
  NewSleepEntry, NewTestResult, NewUser, SleepEntry, TestResult, TestResultRow, User, UserRow,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteExecutor;

const USER_COLUMNS: &str = "id, email, name, role, grade, gender, created_at";

const SLEEP_COLUMNS: &str = "id, user_id, date, bed_time, wake_time, sleep_duration, sleep_quality, \
   screen_time, caffeine_intake, stress_level, notes, created_at";

const TEST_COLUMNS: &str = "id, user_id, start_time, end_time, questions_json, score, adjusted_score, \
   difficulty, alertness_rating, version, created_at";

/// SQLite-backed store
#[derive(Debug, Clone)]
pub struct SqliteStore {
  pool: DbPool,
}

impl SqliteStore {
  pub fn new(pool: DbPool) -> Self {
    Self { pool }
  }

  async fn fetch_users(&self, sql: &str, bind: Option<&str>) -> Result<Vec<User>, StoreError> {
    let mut query = sqlx::query_as::<_, UserRow>(sql);
    if let Some(value) = bind {
      query = query.bind(value);
    }
    query
      .fetch_all(&self.pool)
      .await?
      .into_iter()
      .map(|row| User::try_from(row).map_err(StoreError::Decode))
      .collect()
  }

  async fn fetch_tests(
    &self,
    user_id: Option<i64>,
    since: Option<NaiveDate>,
  ) -> Result<Vec<TestResult>, StoreError> {
    let sql = format!(
      "SELECT {} FROM test_results \
       WHERE (?1 IS NULL OR user_id = ?1) AND (?2 IS NULL OR date(start_time) >= ?2) \
       ORDER BY start_time DESC",
      TEST_COLUMNS
    );
    let rows = sqlx::query_as::<_, TestResultRow>(&sql)
      .bind(user_id)
      .bind(since)
      .fetch_all(&self.pool)
      .await?;

    rows
      .into_iter()
      .map(|row| TestResult::try_from(row).map_err(StoreError::from))
      .collect()
  }

  async fn fetch_sleep(
    &self,
    user_id: Option<i64>,
    since: Option<NaiveDate>,
  ) -> Result<Vec<SleepEntry>, StoreError> {
    let sql = format!(
      "SELECT {} FROM sleep_entries \
       WHERE (?1 IS NULL OR user_id = ?1) AND (?2 IS NULL OR date >= ?2) \
       ORDER BY date DESC",
      SLEEP_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, SleepEntry>(&sql)
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?,
    )
  }
}

/// ---------------------------------------------------------------------------
/// Row Writers
/// ---------------------------------------------------------------------------

async fn write_sleep_row<'e, E: SqliteExecutor<'e>>(
  executor: E,
  entry: &NewSleepEntry,
  created_at: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
  let result = sqlx::query(
    r#"
    INSERT INTO sleep_entries (
      user_id, date, bed_time, wake_time, sleep_duration, sleep_quality,
      screen_time, caffeine_intake, stress_level, notes, created_at
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    "#,
  )
  .bind(entry.user_id)
  .bind(entry.date)
  .bind(entry.bed_time)
  .bind(entry.wake_time)
  .bind(entry.sleep_duration)
  .bind(entry.sleep_quality)
  .bind(entry.screen_time)
  .bind(entry.caffeine_intake)
  .bind(entry.stress_level)
  .bind(&entry.notes)
  .bind(created_at)
  .execute(executor)
  .await?;

  Ok(result.last_insert_rowid())
}

async fn write_test_row<'e, E: SqliteExecutor<'e>>(
  executor: E,
  result: &NewTestResult,
  questions_json: &str,
  created_at: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
  let done = sqlx::query(
    r#"
    INSERT INTO test_results (
      user_id, start_time, end_time, questions_json, score, adjusted_score,
      difficulty, alertness_rating, version, created_at
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    "#,
  )
  .bind(result.user_id)
  .bind(result.start_time)
  .bind(result.end_time)
  .bind(questions_json)
  .bind(result.score)
  .bind(result.adjusted_score)
  .bind(result.difficulty.map(|d| d.as_str()))
  .bind(result.alertness_rating)
  .bind(crate::models::test_result::RESULT_VERSION)
  .bind(created_at)
  .execute(executor)
  .await?;

  Ok(done.last_insert_rowid())
}

impl Store for SqliteStore {
  async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
    let created_at = Utc::now();
    let result = sqlx::query(
      r#"
      INSERT INTO users (email, name, role, grade, gender, created_at)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6)
      "#,
    )
    .bind(&user.email)
    .bind(&user.name)
    .bind(user.role.as_str())
    .bind(user.grade)
    .bind(user.gender.map(|g| g.as_str()))
    .bind(created_at)
    .execute(&self.pool)
    .await
    .map_err(|e| match e {
      sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::Duplicate(user.email.clone()),
      other => StoreError::Database(other),
    })?;

    Ok(User {
      id: result.last_insert_rowid(),
      email: user.email,
      name: user.name,
      role: user.role,
      grade: user.grade,
      gender: user.gender,
      created_at,
    })
  }

  async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
    let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    row.map(|r| User::try_from(r).map_err(StoreError::Decode)).transpose()
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
    let sql = format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS);
    Ok(self.fetch_users(&sql, Some(email)).await?.into_iter().next())
  }

  async fn list_students(&self) -> Result<Vec<User>, StoreError> {
    let sql = format!("SELECT {} FROM users WHERE role = ?1 ORDER BY id", USER_COLUMNS);
    self.fetch_users(&sql, Some("student")).await
  }

  async fn insert_sleep_entry(&self, entry: NewSleepEntry) -> Result<SleepEntry, StoreError> {
    let created_at = Utc::now();
    let id = write_sleep_row(&self.pool, &entry, created_at).await?;
    Ok(entry.into_entry(id, created_at))
  }

  async fn upsert_sleep_entry(&self, entry: NewSleepEntry) -> Result<SleepEntry, StoreError> {
    let created_at = Utc::now();
    let mut tx = self.pool.begin().await?;

    sqlx::query("DELETE FROM sleep_entries WHERE user_id = ?1 AND date = ?2")
      .bind(entry.user_id)
      .bind(entry.date)
      .execute(&mut *tx)
      .await?;
    let id = write_sleep_row(&mut *tx, &entry, created_at).await?;

    tx.commit().await?;
    Ok(entry.into_entry(id, created_at))
  }

  async fn find_sleep_entry(&self, user_id: i64, date: NaiveDate) -> Result<Option<SleepEntry>, StoreError> {
    let sql = format!(
      "SELECT {} FROM sleep_entries WHERE user_id = ?1 AND date = ?2 ORDER BY id DESC LIMIT 1",
      SLEEP_COLUMNS
    );
    Ok(
      sqlx::query_as::<_, SleepEntry>(&sql)
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn sleep_entries_for_user(&self, user_id: i64, since: Option<NaiveDate>) -> Result<Vec<SleepEntry>, StoreError> {
    self.fetch_sleep(Some(user_id), since).await
  }

  async fn sleep_entries_since(&self, since: Option<NaiveDate>) -> Result<Vec<SleepEntry>, StoreError> {
    self.fetch_sleep(None, since).await
  }

  async fn insert_test_result(&self, result: NewTestResult) -> Result<TestResult, StoreError> {
    let created_at = Utc::now();
    let questions_json = serde_json::to_string(&result.questions)?;
    let id = write_test_row(&self.pool, &result, &questions_json, created_at).await?;
    Ok(result.into_result(id, created_at))
  }

  async fn replace_test_result_for_day(&self, result: NewTestResult) -> Result<TestResult, StoreError> {
    let created_at = Utc::now();
    let questions_json = serde_json::to_string(&result.questions)?;
    let mut tx = self.pool.begin().await?;

    sqlx::query("DELETE FROM test_results WHERE user_id = ?1 AND date(start_time) = ?2")
      .bind(result.user_id)
      .bind(result.start_time.date())
      .execute(&mut *tx)
      .await?;
    let id = write_test_row(&mut *tx, &result, &questions_json, created_at).await?;

    tx.commit().await?;
    Ok(result.into_result(id, created_at))
  }

  async fn find_test_result(&self, user_id: i64, date: NaiveDate) -> Result<Option<TestResult>, StoreError> {
    let sql = format!(
      "SELECT {} FROM test_results WHERE user_id = ?1 AND date(start_time) = ?2 \
       ORDER BY start_time DESC LIMIT 1",
      TEST_COLUMNS
    );
    let row = sqlx::query_as::<_, TestResultRow>(&sql)
      .bind(user_id)
      .bind(date)
      .fetch_optional(&self.pool)
      .await?;
    row.map(|r| TestResult::try_from(r).map_err(StoreError::from)).transpose()
  }

  async fn test_results_for_user(&self, user_id: i64, since: Option<NaiveDate>) -> Result<Vec<TestResult>, StoreError> {
    self.fetch_tests(Some(user_id), since).await
  }

  async fn test_results_since(&self, since: Option<NaiveDate>) -> Result<Vec<TestResult>, StoreError> {
    self.fetch_tests(None, since).await
  }
}
