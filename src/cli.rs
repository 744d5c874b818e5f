//! Command-line surface
//!
//! Usage:
//!   sleepy seed --users 24 --days 30 --start 2023-03-27
//!   sleepy stats --email a.nurlanovna@example.kz --range month
//!   sleepy cohort --range all
//!   sleepy log-sleep --email ... --date 2023-04-02 --bed 22:45 --wake 06:30 --quality 4
//!   sleepy questions --count 5
//!   sleepy submit-test --email ... --file attempt.json

use crate::analytics::{DashboardStats, TimeRange};
use crate::commands::{self, CommandError, SleepForm, TestAttempt};
use crate::config::{AppConfig, QuestionConfig};
use crate::db::initialize_db;
use crate::generator::{
  seed, AlertnessModel, PerformanceModel, QuestionBank, SeedOptions, SleepSource, KAZAKH_ROSTER,
};
use crate::models::{CurrentUser, Difficulty};
use crate::questions::{load_questions, OpenAiClient};
use crate::store::{MemoryStore, SqliteStore, Store};
use crate::timestamp::RawId;
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sleepy")]
#[command(about = "Student sleep tracking: sleep/performance analytics and synthetic data")]
#[command(version)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Generate synthetic sleep entries and test results for the roster
  Seed(SeedArgs),

  /// Dashboard for one student, or for a JSON export directory
  Stats {
    /// Student email or user id (reads the database)
    #[arg(long, required_unless_present = "export_dir", conflicts_with = "export_dir")]
    email: Option<String>,

    /// Directory written by `seed --export`
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Narrow an export to one user id
    #[arg(long, requires = "export_dir")]
    user_id: Option<i64>,

    #[arg(long, value_enum, default_value_t = RangeArg::Week)]
    range: RangeArg,
  },

  /// Per-student averages across the cohort
  Cohort {
    #[arg(long, value_enum, default_value_t = RangeArg::Week)]
    range: RangeArg,
  },

  /// Record (or replace) a night of sleep
  #[command(name = "log-sleep")]
  LogSleep(LogSleepArgs),

  /// Request critical thinking questions from the provider
  Questions {
    #[arg(long, default_value_t = 5)]
    count: usize,
  },

  /// Score and store a completed test from a JSON file
  #[command(name = "submit-test")]
  SubmitTest {
    /// Student email or user id
    #[arg(long)]
    email: String,

    #[arg(long)]
    file: PathBuf,
  },
}

#[derive(Args, Debug)]
pub struct SeedArgs {
  /// How many roster members to seed (from the top)
  #[arg(long, default_value_t = KAZAKH_ROSTER.len())]
  pub users: usize,

  #[arg(long, default_value_t = 30)]
  pub days: i64,

  #[arg(long, default_value = "2023-03-27")]
  pub start: NaiveDate,

  /// Leave existing (user, day) records alone; `--skip-existing false` overwrites
  #[arg(long, default_value_t = true, num_args = 0..=1, default_missing_value = "true", action = clap::ArgAction::Set)]
  pub skip_existing: bool,

  /// Seed for a reproducible run
  #[arg(long)]
  pub seed: Option<u64>,

  #[arg(long, value_enum, default_value_t = ModelArg::Revised)]
  pub model: ModelArg,

  /// Questions per synthetic test
  #[arg(long, default_value_t = 5)]
  pub questions: usize,

  #[arg(long, value_enum, default_value_t = BankArg::Arithmetic)]
  pub bank: BankArg,

  /// Force every test to one difficulty
  #[arg(long, value_enum)]
  pub difficulty: Option<DifficultyArg>,

  /// Pause after each write
  #[arg(long, default_value_t = 100)]
  pub delay_ms: u64,

  #[arg(long, value_enum, default_value_t = SleepSourceArg::SameDay)]
  pub sleep_source: SleepSourceArg,

  #[arg(long, value_enum, default_value_t = AlertnessArg::Performance)]
  pub alertness: AlertnessArg,

  /// Generate in memory and write JSON here instead of the database
  #[arg(long)]
  pub export: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct LogSleepArgs {
  /// Student email or user id
  #[arg(long)]
  pub email: String,

  /// The night being reported
  #[arg(long)]
  pub date: NaiveDate,

  /// HH:MM
  #[arg(long, value_parser = parse_clock)]
  pub bed: NaiveTime,

  /// HH:MM (before `--bed` means the next morning)
  #[arg(long, value_parser = parse_clock)]
  pub wake: NaiveTime,

  /// 1-5
  #[arg(long)]
  pub quality: f64,

  /// Hours of screen use before bed
  #[arg(long, default_value_t = 0.0)]
  pub screen_time: f64,

  /// mg
  #[arg(long, default_value_t = 0)]
  pub caffeine: i64,

  /// 1-5
  #[arg(long, default_value_t = 3.0)]
  pub stress: f64,

  #[arg(long)]
  pub notes: Option<String>,
}

fn parse_clock(raw: &str) -> Result<NaiveTime, String> {
  NaiveTime::parse_from_str(raw, "%H:%M")
    .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
    .map_err(|_| format!("expected HH:MM, got '{}'", raw))
}

/// ---------------------------------------------------------------------------
/// Flag Values
/// ---------------------------------------------------------------------------

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeArg {
  Week,
  Month,
  All,
}

impl From<RangeArg> for TimeRange {
  fn from(value: RangeArg) -> Self {
    match value {
      RangeArg::Week => TimeRange::Week,
      RangeArg::Month => TimeRange::Month,
      RangeArg::All => TimeRange::All,
    }
  }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelArg {
  Revised,
  Legacy,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BankArg {
  Arithmetic,
  CriticalThinking,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DifficultyArg {
  Easy,
  Medium,
  Hard,
}

impl From<DifficultyArg> for Difficulty {
  fn from(value: DifficultyArg) -> Self {
    match value {
      DifficultyArg::Easy => Difficulty::Easy,
      DifficultyArg::Medium => Difficulty::Medium,
      DifficultyArg::Hard => Difficulty::Hard,
    }
  }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SleepSourceArg {
  SameDay,
  PreviousNight,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertnessArg {
  Performance,
  Sleep,
}

impl SeedArgs {
  /// Translate flags into generator options
  pub fn options(&self) -> SeedOptions {
    let mut options = SeedOptions {
      start: self.start,
      days: self.days,
      skip_existing: self.skip_existing,
      delay: std::time::Duration::from_millis(self.delay_ms),
      sleep_source: match self.sleep_source {
        SleepSourceArg::SameDay => SleepSource::SameDay,
        SleepSourceArg::PreviousNight => SleepSource::PreviousNight,
      },
      ..SeedOptions::default()
    };

    let test = &mut options.test_model;
    test.performance = match self.model {
      ModelArg::Revised => PerformanceModel::revised(),
      ModelArg::Legacy => PerformanceModel::legacy(),
    };
    test.alertness = match self.alertness {
      AlertnessArg::Performance => AlertnessModel::Performance,
      AlertnessArg::Sleep => AlertnessModel::Sleep,
    };
    test.difficulty_override = self.difficulty.map(Difficulty::from);
    if self.questions > 0 {
      test.questions_per_test = self.questions;
      // Keep a perfect test at 100 points
      test.points_per_question = (100 / self.questions as u32).max(1);
    }

    options
  }

  pub fn bank(&self) -> QuestionBank {
    match self.bank {
      BankArg::Arithmetic => QuestionBank::builtin(),
      BankArg::CriticalThinking => QuestionBank::critical_thinking(),
    }
  }

  fn rng(&self) -> StdRng {
    match self.seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_entropy(),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Dispatch
/// ---------------------------------------------------------------------------

pub async fn execute(cli: Cli) -> Result<(), CommandError> {
  let today = Utc::now().date_naive();

  match cli.command {
    Command::Seed(args) => match &args.export {
      Some(dir) => {
        let store = MemoryStore::new();
        run_seed(&store, &args).await;
        let paths = store.export_json(dir).await?;
        println!("Exported {}", paths.users.display());
        println!("Exported {}", paths.sleep_entries.display());
        println!("Exported {}", paths.test_results.display());
        Ok(())
      }
      None => {
        let store = open_store().await?;
        run_seed(&store, &args).await;
        Ok(())
      }
    },

    Command::Stats { email, export_dir, user_id, range } => {
      let stats = match (email, export_dir) {
        (_, Some(dir)) => commands::dashboard_from_export(&dir, user_id.map(RawId::from).as_ref())?,
        (Some(email), None) => {
          let store = open_store().await?;
          let user = commands::resolve_user(&store, &email).await?;
          commands::student_dashboard(&store, &CurrentUser::from(&user), range.into(), today).await
        }
        (None, None) => return Err(CommandError::InvalidInput("--email or --export-dir is required".into())),
      };
      print_dashboard(&stats)
    }

    Command::Cohort { range } => {
      let store = open_store().await?;
      let report = commands::cohort_report(&store, range.into(), today).await?;
      if report.students.is_empty() {
        println!("No students found");
        return Ok(());
      }
      for s in &report.students {
        println!(
          "{:<28} score {:>5.1}  sleep {:>4.1}h  quality {:>3.1}  ({} tests, {} nights)",
          s.name, s.avg_score, s.avg_sleep, s.avg_quality, s.tests, s.nights
        );
      }
      print_json(&report)
    }

    Command::LogSleep(args) => {
      let store = open_store().await?;
      let user = commands::resolve_user(&store, &args.email).await?;
      let form = SleepForm {
        date: args.date,
        bed_time: args.bed,
        wake_time: args.wake,
        sleep_quality: args.quality,
        screen_time: args.screen_time,
        caffeine_intake: args.caffeine,
        stress_level: args.stress,
        notes: args.notes,
      };
      let entry = commands::submit_sleep_entry(&store, &CurrentUser::from(&user), form).await?;
      println!("Saved {} hours for {} ({})", entry.sleep_duration, user.name, entry.date);
      Ok(())
    }

    Command::Questions { count } => {
      let config = QuestionConfig::from_env()?;
      let client = OpenAiClient::new(&config)?;
      let questions = load_questions(&client, count).await?;
      print_json(&questions)
    }

    Command::SubmitTest { email, file } => {
      let attempt: TestAttempt = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
      let store = open_store().await?;
      let user = commands::resolve_user(&store, &email).await?;
      let result = commands::submit_test(&store, &CurrentUser::from(&user), attempt).await?;
      println!(
        "Scored {}/{} (adjusted {}) for {}",
        result.score,
        result.questions.len(),
        result.adjusted_score.unwrap_or(result.score),
        user.name
      );
      Ok(())
    }
  }
}

async fn open_store() -> Result<SqliteStore, CommandError> {
  let config = AppConfig::from_env()?;
  let pool = initialize_db(&config.database_url).await?;
  Ok(SqliteStore::new(pool))
}

async fn run_seed<S: Store>(store: &S, args: &SeedArgs) {
  let roster = &KAZAKH_ROSTER[..args.users.min(KAZAKH_ROSTER.len())];
  let options = args.options();
  let bank = args.bank();
  let mut rng = args.rng();

  let summary = seed(store, roster, &options, &bank, &mut rng).await;
  println!("{}", summary);
}

fn print_dashboard(stats: &DashboardStats) -> Result<(), CommandError> {
  if !stats.has_data {
    println!("No data available for the selected range");
    return Ok(());
  }

  let avg = &stats.averages;
  println!(
    "{} days | score {:.1} | sleep {:.1}h | quality {:.1} | alertness {:.1}",
    stats.rows.len(),
    avg.test_score,
    avg.sleep_duration,
    avg.sleep_quality,
    avg.alertness
  );
  for c in &stats.correlations {
    println!("  {:<16} r = {:>6.3} ({} days)", c.factor.label(), c.correlation, c.pairs);
  }
  print_json(stats)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
