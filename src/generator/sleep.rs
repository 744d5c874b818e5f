use super::{grade_of, is_female, is_weekend};
use crate::models::{NewSleepEntry, User};
use crate::scoring::round_to;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::Rng;

/// Tunables for synthetic sleep entries
#[derive(Debug, Clone, PartialEq)]
pub struct SleepModel {
  /// Bed hour window for grade 9 and below; grade 10 and 11+ shift by one
  /// hour each. 24 is midnight.
  pub junior_bed_window: (u32, u32),
  pub earliest_bed_hour: u32,
  pub latest_bed_hour: u32,
  pub weekend_bed_shift: u32,
  pub female_bed_offset_minutes: i64,

  pub base_duration: f64,
  /// Added per grade below 12
  pub grade_duration_step: f64,
  pub female_duration_bonus: f64,
  pub weekend_duration_bonus: f64,
  pub duration_jitter: f64,
  pub min_duration: f64,
  pub max_duration: f64,

  pub quality_range: (f64, f64),

  pub screen_range: (f64, f64),
  pub senior_screen_bonus: f64,
  pub weekend_screen_bonus: f64,
  pub max_screen: f64,

  /// Probability of a low-caffeine day
  pub light_caffeine_chance: f64,
  pub light_caffeine_mg: (i64, i64),
  pub heavy_caffeine_mg: (i64, i64),
  pub senior_caffeine_extra_mg: (i64, i64),

  pub stress_range: (f64, f64),
  pub senior_stress_bonus: f64,
  pub weekday_stress_bonus: f64,
  pub max_stress: f64,
}

impl Default for SleepModel {
  fn default() -> Self {
    Self {
      junior_bed_window: (20, 22),
      earliest_bed_hour: 20,
      latest_bed_hour: 24,
      weekend_bed_shift: 1,
      female_bed_offset_minutes: 30,

      base_duration: 7.5,
      grade_duration_step: 0.1,
      female_duration_bonus: 0.2,
      weekend_duration_bonus: 0.5,
      duration_jitter: 0.4,
      min_duration: 5.0,
      max_duration: 10.0,

      quality_range: (1.5, 5.0),

      screen_range: (1.0, 4.0),
      senior_screen_bonus: 1.0,
      weekend_screen_bonus: 1.0,
      max_screen: 8.0,

      light_caffeine_chance: 0.7,
      light_caffeine_mg: (0, 150),
      heavy_caffeine_mg: (150, 300),
      senior_caffeine_extra_mg: (0, 100),

      stress_range: (1.0, 4.0),
      senior_stress_bonus: 0.5,
      weekday_stress_bonus: 0.5,
      max_stress: 5.0,
    }
  }
}

impl SleepModel {
  /// Bed hour bounds for a grade on a given kind of day
  pub fn bed_window(&self, grade: i64, weekend: bool) -> (u32, u32) {
    let shift = match grade {
      g if g <= 9 => 0,
      10 => 1,
      _ => 2,
    };
    let (lo, hi) = self.junior_bed_window;
    let (mut lo, mut hi) = ((lo + shift).min(self.latest_bed_hour), (hi + shift).min(self.latest_bed_hour));
    if weekend {
      lo = (lo + self.weekend_bed_shift).min(self.latest_bed_hour);
      hi = (hi + self.weekend_bed_shift).min(self.latest_bed_hour);
    }
    (lo, hi)
  }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (f64, f64)) -> f64 {
  round_to(rng.gen_range(lo..=hi), 1)
}

/// ---------------------------------------------------------------------------
/// Sleep Entry Generation
/// ---------------------------------------------------------------------------

/// Synthesize the night of `date` for `user`
pub fn generate_sleep_entry<R: Rng + ?Sized>(
  user: &User,
  date: NaiveDate,
  model: &SleepModel,
  rng: &mut R,
) -> NewSleepEntry {
  let grade = grade_of(user);
  let female = is_female(user);
  let weekend = is_weekend(date);
  let senior = grade >= 11;

  // Bed time
  let (lo, hi) = model.bed_window(grade, weekend);
  let jitter: i64 = rng.gen_range(-1..=1);
  let hour = (rng.gen_range(lo..=hi) as i64 + jitter)
    .clamp(model.earliest_bed_hour as i64, model.latest_bed_hour as i64);
  let minute: i64 = rng.gen_range(0..60);

  let midnight = date.and_time(chrono::NaiveTime::MIN);
  let mut bed_time: NaiveDateTime = midnight + Duration::hours(hour) + Duration::minutes(minute);
  if female {
    let earliest = midnight + Duration::hours(model.earliest_bed_hour as i64);
    bed_time = (bed_time - Duration::minutes(model.female_bed_offset_minutes)).max(earliest);
  }

  // Duration
  let mut duration = model.base_duration + (12 - grade).max(0) as f64 * model.grade_duration_step;
  if female {
    duration += model.female_duration_bonus;
  }
  if weekend {
    duration += model.weekend_duration_bonus;
  }
  duration += rng.gen_range(-model.duration_jitter..=model.duration_jitter);
  let sleep_duration = round_to(duration.clamp(model.min_duration, model.max_duration), 1);

  let wake_time = bed_time + Duration::minutes((sleep_duration * 60.0).round() as i64);

  // Habits
  let sleep_quality = uniform(rng, model.quality_range);

  let mut screen_time = uniform(rng, model.screen_range);
  if senior {
    screen_time += model.senior_screen_bonus;
  }
  if weekend {
    screen_time += model.weekend_screen_bonus;
  }
  let screen_time = round_to(screen_time.min(model.max_screen), 1);

  let (lo_mg, hi_mg) = if rng.gen_bool(model.light_caffeine_chance) {
    model.light_caffeine_mg
  } else {
    model.heavy_caffeine_mg
  };
  let mut caffeine_intake = rng.gen_range(lo_mg..=hi_mg);
  if senior {
    let (lo, hi) = model.senior_caffeine_extra_mg;
    caffeine_intake += rng.gen_range(lo..=hi);
  }

  let mut stress_level = uniform(rng, model.stress_range);
  if senior {
    stress_level += model.senior_stress_bonus;
  }
  if !weekend {
    stress_level += model.weekday_stress_bonus;
  }
  let stress_level = round_to(stress_level.min(model.max_stress), 1);

  NewSleepEntry {
    user_id: user.id,
    date,
    bed_time,
    wake_time,
    sleep_duration,
    sleep_quality,
    screen_time,
    caffeine_intake,
    stress_level,
    notes: None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::Gender;
  use crate::test_utils::{day, mock_user};
  use chrono::Timelike;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  #[test]
  fn test_bed_windows() {
    let model = SleepModel::default();
    assert_eq!(model.bed_window(9, false), (20, 22));
    assert_eq!(model.bed_window(10, false), (21, 23));
    assert_eq!(model.bed_window(12, false), (22, 24));
    assert_eq!(model.bed_window(9, true), (21, 23));
    assert_eq!(model.bed_window(11, true), (23, 24));
  }

  #[test]
  fn test_grade_nine_male_monday() {
    let user = mock_user(1, 9, Gender::Male);
    let model = SleepModel::default();
    let monday = day(2023, 3, 27);
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..200 {
      let entry = generate_sleep_entry(&user, monday, &model, &mut rng);
      assert_eq!(entry.bed_time.date(), monday);
      assert!((20..=23).contains(&entry.bed_time.hour()));
      assert!((5.0..=10.0).contains(&entry.sleep_duration));
    }
  }

  #[test]
  fn test_generated_entries_stay_in_range() {
    let model = SleepModel::default();
    let mut rng = StdRng::seed_from_u64(1);

    for (grade, gender) in [(9, Gender::Female), (10, Gender::Male), (11, Gender::Female), (12, Gender::Male)] {
      let user = mock_user(2, grade, gender);
      for offset in 0..14 {
        let date = day(2023, 3, 27) + Duration::days(offset);
        let entry = generate_sleep_entry(&user, date, &model, &mut rng);

        assert!(entry.wake_time > entry.bed_time);
        assert!((5.0..=10.0).contains(&entry.sleep_duration));
        assert_eq!(round_to(entry.sleep_duration, 1), entry.sleep_duration);
        let minutes = (entry.wake_time - entry.bed_time).num_minutes();
        assert_eq!(minutes, (entry.sleep_duration * 60.0).round() as i64);

        // Never before 20:00 of the night, never past 00:59 the next day
        assert!(entry.bed_time >= date.and_hms_opt(20, 0, 0).unwrap());
        assert!(entry.bed_time < date.and_hms_opt(23, 59, 0).unwrap() + Duration::hours(1) + Duration::minutes(1));

        assert!((1.5..=5.0).contains(&entry.sleep_quality));
        assert!((1.0..=8.0).contains(&entry.screen_time));
        assert!((0..=400).contains(&entry.caffeine_intake));
        assert!((1.0..=5.0).contains(&entry.stress_level));
      }
    }
  }

  #[test]
  fn test_same_seed_same_entry() {
    let user = mock_user(3, 10, Gender::Female);
    let model = SleepModel::default();
    let a = generate_sleep_entry(&user, day(2023, 4, 1), &model, &mut StdRng::seed_from_u64(9));
    let b = generate_sleep_entry(&user, day(2023, 4, 1), &model, &mut StdRng::seed_from_u64(9));
    assert_eq!(a, b);
  }
}
