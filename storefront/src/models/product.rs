// storefront/src/models/product.rs

use sqlx::FromRow;

use storefront_core::model::Money;
use storefront_core::CatalogProduct;

#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
  pub id: String,
  pub title: String,
  pub price_cents: i64,
  pub image: Option<String>,
}

impl From<ProductRow> for CatalogProduct {
  fn from(row: ProductRow) -> Self {
    CatalogProduct {
      id: row.id,
      title: row.title,
      price: Money::from_cents(row.price_cents),
      image: row.image,
    }
  }
}
