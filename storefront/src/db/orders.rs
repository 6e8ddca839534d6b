// storefront/src/db/orders.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use storefront_core::model::{NewOrder, Order, OrderItem, OrderStatus, UserId};
use storefront_core::{InsertOutcome, OrderStore, StoreError, StoreResult};

use crate::db::unavailable;
use crate::models::order::ORDER_COLUMNS;
use crate::models::{OrderItemRow, OrderRow};

/// Orders in Postgres.
///
/// Idempotency rests on the unique index over `stripe_session_id`: concurrent inserts for one
/// session serialise on it and all but one become no-ops. Completion is a conditional `UPDATE`.
pub struct PgOrderStore {
  pool: PgPool,
}

impl PgOrderStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn items_for(&self, order_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<OrderItem>>> {
    let rows: Vec<OrderItemRow> = sqlx::query_as(
      "SELECT order_id, product_id, quantity, unit_price_cents FROM order_items WHERE order_id = ANY($1) ORDER BY id",
    )
    .bind(order_ids.to_vec())
    .fetch_all(&self.pool)
    .await
    .map_err(unavailable)?;

    let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for row in rows {
      let order_id = row.order_id;
      by_order.entry(order_id).or_default().push(row.into_item()?);
    }
    Ok(by_order)
  }

  async fn with_items(&self, row: OrderRow) -> StoreResult<Order> {
    let items = self.items_for(&[row.id]).await?.remove(&row.id).unwrap_or_default();
    row.into_order(items)
  }

  async fn find_by_session(&self, session_id: &str) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> =
      sqlx::query_as(&format!("SELECT {} FROM orders WHERE stripe_session_id = $1", ORDER_COLUMNS))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;
    match row {
      Some(row) => Ok(Some(self.with_items(row).await?)),
      None => Ok(None),
    }
  }
}

async fn insert_row(conn: &mut PgConnection, id: Uuid, order: &NewOrder) -> StoreResult<Option<OrderRow>> {
  let sql = format!(
    "INSERT INTO orders (id, user_id, stripe_session_id, status, total_cents) VALUES ($1, $2, $3, 'pending', $4) \
     ON CONFLICT (stripe_session_id) DO NOTHING RETURNING {}",
    ORDER_COLUMNS
  );
  sqlx::query_as(&sql)
    .bind(id)
    .bind(order.user_id.as_str())
    .bind(order.session_id.as_deref())
    .bind(order.total.cents())
    .fetch_optional(conn)
    .await
    .map_err(unavailable)
}

async fn insert_items(conn: &mut PgConnection, order_id: Uuid, items: &[OrderItem]) -> StoreResult<()> {
  let mut product_ids = Vec::with_capacity(items.len());
  let mut quantities = Vec::with_capacity(items.len());
  let mut prices = Vec::with_capacity(items.len());
  for item in items {
    product_ids.push(item.product_id.clone());
    quantities.push(
      i32::try_from(item.quantity)
        .map_err(|_| StoreError::Invalid(format!("quantity {} out of range", item.quantity)))?,
    );
    prices.push(item.unit_price_at_purchase.cents());
  }

  sqlx::query(
    "INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents) \
     SELECT $1, * FROM UNNEST($2::text[], $3::int4[], $4::int8[])",
  )
  .bind(order_id)
  .bind(product_ids)
  .bind(quantities)
  .bind(prices)
  .execute(conn)
  .await
  .map_err(unavailable)?;
  Ok(())
}

#[async_trait]
impl OrderStore for PgOrderStore {
  #[instrument(name = "pg_store::insert_if_absent", skip_all, fields(session_id = ?order.session_id, user_id = %order.user_id))]
  async fn insert_if_absent(&self, order: NewOrder) -> StoreResult<InsertOutcome> {
    let session_id = order
      .session_id
      .clone()
      .ok_or_else(|| StoreError::Invalid("insert_if_absent requires a session id".to_string()))?;

    let mut tx = self.pool.begin().await.map_err(unavailable)?;
    let inserted = insert_row(&mut tx, Uuid::new_v4(), &order).await?;

    match inserted {
      Some(row) => {
        insert_items(&mut tx, row.id, &order.items).await?;
        tx.commit().await.map_err(unavailable)?;
        debug!(order_id = %row.id, "Order row inserted.");
        Ok(InsertOutcome::Created(row.into_order(order.items)?))
      }
      None => {
        tx.rollback().await.map_err(unavailable)?;
        let existing = self
          .find_by_session(&session_id)
          .await?
          .ok_or_else(|| StoreError::Corrupt(format!("session {} conflicted but no order exists", session_id)))?;
        debug!(order_id = %existing.id, "Order for session already exists.");
        Ok(InsertOutcome::AlreadyExists(existing))
      }
    }
  }

  #[instrument(name = "pg_store::insert_manual", skip_all, fields(user_id = %order.user_id))]
  async fn insert_manual(&self, mut order: NewOrder) -> StoreResult<Order> {
    order.session_id = None;
    let mut tx = self.pool.begin().await.map_err(unavailable)?;
    let row = insert_row(&mut tx, Uuid::new_v4(), &order)
      .await?
      .ok_or_else(|| StoreError::Corrupt("manual insert returned no row".to_string()))?;
    insert_items(&mut tx, row.id, &order.items).await?;
    tx.commit().await.map_err(unavailable)?;
    row.into_order(order.items)
  }

  #[instrument(name = "pg_store::find_for_owner", skip_all, fields(order_id = %order_id, user_id = %user_id))]
  async fn find_for_owner(&self, order_id: Uuid, user_id: &UserId) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> =
      sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1 AND user_id = $2", ORDER_COLUMNS))
        .bind(order_id)
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;
    match row {
      Some(row) => Ok(Some(self.with_items(row).await?)),
      None => Ok(None),
    }
  }

  #[instrument(name = "pg_store::list_for_owner", skip_all, fields(user_id = %user_id))]
  async fn list_for_owner(&self, user_id: &UserId) -> StoreResult<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id",
      ORDER_COLUMNS
    ))
    .bind(user_id.as_str())
    .fetch_all(&self.pool)
    .await
    .map_err(unavailable)?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut items = if ids.is_empty() {
      HashMap::new()
    } else {
      self.items_for(&ids).await?
    };
    rows
      .into_iter()
      .map(|row| {
        let order_items = items.remove(&row.id).unwrap_or_default();
        row.into_order(order_items)
      })
      .collect()
  }

  #[instrument(
    name = "pg_store::transition_status",
    skip_all,
    fields(order_id = %order_id, user_id = %user_id, expected = %expected, next = %next)
  )]
  async fn transition_status(
    &self,
    order_id: Uuid,
    user_id: &UserId,
    expected: OrderStatus,
    next: OrderStatus,
    at: DateTime<Utc>,
  ) -> StoreResult<Option<Order>> {
    let completed_at = (next == OrderStatus::Completed).then_some(at);
    let row: Option<OrderRow> = sqlx::query_as(&format!(
      "UPDATE orders SET status = $4, completed_at = COALESCE($5, completed_at) \
       WHERE id = $1 AND user_id = $2 AND status = $3 RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(user_id.as_str())
    .bind(expected.as_str())
    .bind(next.as_str())
    .bind(completed_at)
    .fetch_optional(&self.pool)
    .await
    .map_err(unavailable)?;

    match row {
      Some(row) => Ok(Some(self.with_items(row).await?)),
      None => Ok(None),
    }
  }
}
