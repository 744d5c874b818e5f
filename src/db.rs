use crate::store::StoreError;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub type DbPool = SqlitePool;

/// Connect to the database at `database_url` and run migrations
pub async fn initialize_db(database_url: &str) -> Result<DbPool, StoreError> {
  tracing::info!(url = %database_url, "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(database_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!("Database initialized successfully");

  Ok(pool)
}

