// core/src/catalog.rs

//! Read-only access to current product data, for display next to orders.
//!
//! Catalog prices are never used to price an order; orders keep the price they were bought at.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::money::Money;
use crate::store::StoreResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
  pub id: String,
  pub title: String,
  pub price: Money,
  pub image: Option<String>,
}

#[async_trait]
pub trait CatalogReader: Send + Sync {
  /// Products for the given ids; unknown ids are simply absent from the result.
  async fn products_by_ids(&self, ids: &[String]) -> StoreResult<Vec<CatalogProduct>>;
}

#[derive(Default)]
pub struct InMemoryCatalog {
  products: RwLock<HashMap<String, CatalogProduct>>,
}

impl InMemoryCatalog {
  pub fn new(products: impl IntoIterator<Item = CatalogProduct>) -> Self {
    Self {
      products: RwLock::new(products.into_iter().map(|p| (p.id.clone(), p)).collect()),
    }
  }

  pub fn upsert(&self, product: CatalogProduct) {
    self.products.write().insert(product.id.clone(), product);
  }
}

#[async_trait]
impl CatalogReader for InMemoryCatalog {
  async fn products_by_ids(&self, ids: &[String]) -> StoreResult<Vec<CatalogProduct>> {
    let products = self.products.read();
    Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
  }
}
