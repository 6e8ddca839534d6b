// storefront/src/db/mod.rs

//! Postgres implementations of the order store and catalog reader.

pub mod catalog;
pub mod orders;

pub use catalog::PgCatalog;
pub use orders::PgOrderStore;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, instrument};

use crate::errors::Result;

const SCHEMA: &str = include_str!("schema.sql");

#[instrument(name = "db::connect", skip_all)]
pub async fn connect(database_url: &str) -> Result<PgPool> {
  let pool = PgPoolOptions::new()
    .max_connections(10)
    .acquire_timeout(Duration::from_secs(5))
    .connect(database_url)
    .await?;
  info!("Successfully connected to the database.");
  Ok(pool)
}

/// Creates the tables and indexes if they do not exist yet.
#[instrument(name = "db::apply_schema", skip_all)]
pub async fn apply_schema(pool: &PgPool) -> Result<()> {
  sqlx::raw_sql(SCHEMA).execute(pool).await?;
  info!("Database schema applied.");
  Ok(())
}

pub(crate) fn unavailable(err: sqlx::Error) -> storefront_core::StoreError {
  storefront_core::StoreError::Unavailable(err.to_string())
}
