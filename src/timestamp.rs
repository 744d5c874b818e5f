//! Timestamp normalization at the analytics boundary
//!
//! Records reach the analytics engine with dates in several shapes: native
//! date-times from the store, `{seconds, nanoseconds}` pairs from document
//! exports, and ISO-8601 strings. Everything is reduced to a calendar-day key.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimestampError {
  #[error("Epoch timestamp out of range: {seconds}s {nanoseconds}ns")]
  OutOfRange { seconds: i64, nanoseconds: u32 },

  #[error("Unrecognized timestamp: {0}")]
  Unparseable(String),
}

/// A timestamp as it appears in a raw record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
  EpochPair {
    #[serde(alias = "_seconds")]
    seconds: i64,
    #[serde(default, alias = "_nanoseconds")]
    nanoseconds: u32,
  },
  IsoString(String),
  Native(NaiveDateTime),
}

impl From<NaiveDateTime> for RawTimestamp {
  fn from(value: NaiveDateTime) -> Self {
    RawTimestamp::Native(value)
  }
}

impl From<NaiveDate> for RawTimestamp {
  fn from(value: NaiveDate) -> Self {
    RawTimestamp::Native(value.and_time(chrono::NaiveTime::MIN))
  }
}

impl RawTimestamp {
  /// Calendar day of the timestamp. Instants (epoch pairs, offset strings)
  /// use the UTC day; naive values keep their own day.
  pub fn date_key(&self) -> Result<NaiveDate, TimestampError> {
    match self {
      RawTimestamp::Native(dt) => Ok(dt.date()),
      RawTimestamp::EpochPair { seconds, nanoseconds } => DateTime::from_timestamp(*seconds, *nanoseconds)
        .map(|dt| dt.date_naive())
        .ok_or(TimestampError::OutOfRange {
          seconds: *seconds,
          nanoseconds: *nanoseconds,
        }),
      RawTimestamp::IsoString(s) => parse_iso_date(s),
    }
  }

  /// `YYYY-MM-DD`
  pub fn day_string(&self) -> Result<String, TimestampError> {
    Ok(self.date_key()?.format("%Y-%m-%d").to_string())
  }
}

fn parse_iso_date(raw: &str) -> Result<NaiveDate, TimestampError> {
  let s = raw.trim();

  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.naive_utc().date());
  }

  for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
      return Ok(dt.date());
    }
  }

  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| TimestampError::Unparseable(raw.to_string()))
}

/// Record identifiers arrive as text or numbers depending on the source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
  Number(i64),
  Text(String),
}

impl std::fmt::Display for RawId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      RawId::Number(n) => write!(f, "{}", n),
      RawId::Text(s) => f.write_str(s),
    }
  }
}

impl From<i64> for RawId {
  fn from(value: i64) -> Self {
    RawId::Number(value)
  }
}
