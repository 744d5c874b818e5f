//! Synthetic data generator
//!
//! Produces sleep entries and quiz results for a roster of students. Every
//! function takes its randomness from the caller so runs can be replayed
//! with a seeded RNG.

pub mod batch;
pub mod questions;
pub mod roster;
pub mod sleep;

pub use batch::{seed, SeedOptions, SleepSource};
pub use questions::QuestionBank;
pub use roster::KAZAKH_ROSTER;
pub use test::{AlertnessModel, PerformanceModel};

use crate::models::{Difficulty, Gender, User};
use crate::store::StoreError;
use chrono::{Datelike, NaiveDate, Weekday};
use thiserror::Error;

/// Grade assumed for users without one
pub const DEFAULT_GRADE: i64 = 10;

#[derive(Error, Debug)]
pub enum GeneratorError {
  #[error("No questions available for {0} difficulty")]
  EmptyBank(Difficulty),

  #[error("Store error: {0}")]
  Store(#[from] StoreError),
}

pub(crate) fn grade_of(user: &User) -> i64 {
  user.grade.unwrap_or(DEFAULT_GRADE)
}

pub(crate) fn is_female(user: &User) -> bool {
  user.gender == Some(Gender::Female)
}

pub(crate) fn is_weekend(date: NaiveDate) -> bool {
  matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
