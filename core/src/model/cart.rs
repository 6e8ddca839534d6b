// core/src/model/cart.rs

use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, CheckoutResult};
use crate::model::money::Money;

/// One cart line as the storefront client submits it.
///
/// `price` is the major-unit unit price shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
  pub id: String,
  pub title: String,
  pub price: f64,
  pub quantity: i64,
  #[serde(default)]
  pub image: Option<String>,
}

/// A client-owned cart, passed by value into the session builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
  pub items: Vec<CartItem>,
}

/// A cart line that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCartLine<'a> {
  pub item: &'a CartItem,
  pub quantity: u32,
  pub unit_price: Money,
}

impl Cart {
  pub fn new(items: Vec<CartItem>) -> Self {
    Self { items }
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// Checks every line and returns them with typed quantity and price.
  pub fn validated_lines(&self) -> CheckoutResult<Vec<ValidCartLine<'_>>> {
    if self.items.is_empty() {
      return Err(CheckoutError::Validation("cart is empty".to_string()));
    }

    self
      .items
      .iter()
      .enumerate()
      .map(|(idx, item)| {
        if item.id.trim().is_empty() {
          return Err(CheckoutError::Validation(format!("item {} has no product id", idx)));
        }
        let quantity = u32::try_from(item.quantity)
          .ok()
          .filter(|q| *q > 0)
          .ok_or_else(|| {
            CheckoutError::Validation(format!(
              "item '{}' has invalid quantity {}",
              item.id, item.quantity
            ))
          })?;
        if !item.price.is_finite() || item.price < 0.0 {
          return Err(CheckoutError::Validation(format!(
            "item '{}' has invalid price {}",
            item.id, item.price
          )));
        }
        let unit_price = Money::from_major(item.price).ok_or_else(|| {
          CheckoutError::Validation(format!("item '{}' price out of range", item.id))
        })?;
        Ok(ValidCartLine {
          item,
          quantity,
          unit_price,
        })
      })
      .collect()
  }
}
