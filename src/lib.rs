mod analytics;
mod cli;
mod commands;
mod config;
mod db;
mod generator;
mod models;
mod questions;
mod scoring;
mod store;
mod timestamp;

#[cfg(test)]
mod test_utils;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub fn run() -> ExitCode {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sleepy=info,sleepy_lib=info"));
  tracing_subscriber::registry()
    .with(filter)
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let cli = cli::Cli::parse();

  let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
    Ok(runtime) => runtime,
    Err(e) => {
      tracing::error!("Failed to start runtime: {}", e);
      return ExitCode::FAILURE;
    }
  };

  match runtime.block_on(cli::execute(cli)) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      tracing::error!("{}", e);
      eprintln!("Error: {}", e);
      ExitCode::FAILURE
    }
  }
}
