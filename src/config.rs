//! Environment-driven configuration
//!
//! `.env` is loaded by the CLI before any of this runs.

use std::env;
use thiserror::Error;
use url::Url;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://sleepy.db?mode=rwc";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1/";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Missing configuration: {0}")]
  MissingConfig(String),

  #[error("Invalid URL in {var}: {source}")]
  InvalidUrl {
    var: String,
    #[source]
    source: url::ParseError,
  },
}

/// ---------------------------------------------------------------------------
/// App Config
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
  pub database_url: String,
}

impl AppConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    let database_url = env::var("SLEEPY_DATABASE_URL")
      .ok()
      .filter(|v| !v.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

    Ok(Self { database_url })
  }
}

/// ---------------------------------------------------------------------------
/// Question Provider Config
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionConfig {
  pub api_key: String,
  pub base_url: Url,
  pub model: String,
}

impl QuestionConfig {
  /// Requires `OPENAI_API_KEY`; base URL and model fall back to the public API
  pub fn from_env() -> Result<Self, ConfigError> {
    let api_key = env::var("OPENAI_API_KEY")
      .ok()
      .filter(|v| !v.trim().is_empty())
      .ok_or_else(|| ConfigError::MissingConfig("OPENAI_API_KEY".into()))?;

    let raw_base = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string());
    let base_url = parse_base_url(&raw_base).map_err(|source| ConfigError::InvalidUrl {
      var: "OPENAI_BASE_URL".into(),
      source,
    })?;

    let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string());

    Ok(Self { api_key, base_url, model })
  }
}

/// Parse a base URL so that relative joins append to its path
pub fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
  let raw = raw.trim();
  if raw.ends_with('/') {
    Url::parse(raw)
  } else {
    Url::parse(&format!("{}/", raw))
  }
}
