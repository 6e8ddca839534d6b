// storefront/src/db/catalog.rs

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use storefront_core::{CatalogProduct, CatalogReader, StoreResult};

use crate::db::unavailable;
use crate::models::ProductRow;

pub struct PgCatalog {
  pool: PgPool,
}

impl PgCatalog {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl CatalogReader for PgCatalog {
  #[instrument(name = "pg_catalog::products_by_ids", skip_all, fields(ids = ids.len()))]
  async fn products_by_ids(&self, ids: &[String]) -> StoreResult<Vec<CatalogProduct>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let rows: Vec<ProductRow> = sqlx::query_as("SELECT id, title, price_cents, image FROM products WHERE id = ANY($1)")
      .bind(ids.to_vec())
      .fetch_all(&self.pool)
      .await
      .map_err(unavailable)?;
    Ok(rows.into_iter().map(CatalogProduct::from).collect())
  }
}
