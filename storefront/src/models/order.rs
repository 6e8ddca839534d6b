// storefront/src/models/order.rs

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use storefront_core::model::{Money, Order, OrderItem, OrderStatus, UserId};
use storefront_core::StoreError;

/// Column list shared by every query that returns an `OrderRow`.
pub const ORDER_COLUMNS: &str = "id, user_id, stripe_session_id, status, total_cents, created_at, completed_at";

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub user_id: String,
  pub stripe_session_id: Option<String>,
  pub status: String,
  pub total_cents: i64,
  pub created_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
  pub order_id: Uuid,
  pub product_id: String,
  pub quantity: i32,
  pub unit_price_cents: i64,
}

impl OrderItemRow {
  pub fn into_item(self) -> Result<OrderItem, StoreError> {
    let quantity = u32::try_from(self.quantity)
      .map_err(|_| StoreError::Corrupt(format!("order {} has quantity {}", self.order_id, self.quantity)))?;
    Ok(OrderItem {
      product_id: self.product_id,
      quantity,
      unit_price_at_purchase: Money::from_cents(self.unit_price_cents),
    })
  }
}

impl OrderRow {
  pub fn into_order(self, items: Vec<OrderItem>) -> Result<Order, StoreError> {
    let status: OrderStatus = self
      .status
      .parse()
      .map_err(|e: String| StoreError::Corrupt(format!("order {}: {}", self.id, e)))?;
    Ok(Order {
      id: self.id,
      user_id: UserId::new(self.user_id),
      session_id: self.stripe_session_id,
      status,
      total: Money::from_cents(self.total_cents),
      items,
      created_at: self.created_at,
      completed_at: self.completed_at,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(status: &str) -> OrderRow {
    OrderRow {
      id: Uuid::new_v4(),
      user_id: "user-1".into(),
      stripe_session_id: Some("cs_1".into()),
      status: status.into(),
      total_cents: 2000,
      created_at: Utc::now(),
      completed_at: None,
    }
  }

  #[test]
  fn converts_rows_into_orders() {
    let item = OrderItemRow {
      order_id: Uuid::new_v4(),
      product_id: "p1".into(),
      quantity: 2,
      unit_price_cents: 1000,
    }
    .into_item()
    .unwrap();
    let order = row("pending").into_order(vec![item]).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total, Money::from_cents(2000));
    assert_eq!(order.items[0].quantity, 2);
  }

  #[test]
  fn unknown_status_is_corrupt() {
    assert!(matches!(row("shipped").into_order(Vec::new()), Err(StoreError::Corrupt(_))));
  }

  #[test]
  fn negative_quantity_is_corrupt() {
    let item = OrderItemRow {
      order_id: Uuid::new_v4(),
      product_id: "p1".into(),
      quantity: -1,
      unit_price_cents: 1000,
    };
    assert!(matches!(item.into_item(), Err(StoreError::Corrupt(_))));
  }
}
