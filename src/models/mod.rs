pub mod sleep;
pub mod test_result;
pub mod user;

pub use sleep::{NewSleepEntry, SleepEntry};
pub use test_result::{Difficulty, NewTestResult, QuestionSnapshot, TestResult, TestResultRow};
pub use user::{CurrentUser, Gender, NewUser, Role, User, UserRow};
