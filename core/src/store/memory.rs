// core/src/store/memory.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use crate::model::identity::UserId;
use crate::model::order::{NewOrder, Order, OrderStatus};
use crate::store::{InsertOutcome, OrderStore, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
  orders: HashMap<Uuid, Order>,
  by_session: HashMap<String, Uuid>,
}

/// Process-local store. Each operation runs under one mutex, which gives the same atomicity the
/// Postgres unique index and conditional update give.
#[derive(Default)]
pub struct InMemoryOrderStore {
  tables: Mutex<Tables>,
}

impl InMemoryOrderStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.tables.lock().orders.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn orders_for_session(&self, session_id: &str) -> Vec<Order> {
    self
      .tables
      .lock()
      .orders
      .values()
      .filter(|o| o.session_id.as_deref() == Some(session_id))
      .cloned()
      .collect()
  }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
  async fn insert_if_absent(&self, order: NewOrder) -> StoreResult<InsertOutcome> {
    let session_id = order
      .session_id
      .clone()
      .ok_or_else(|| StoreError::Invalid("insert_if_absent requires a session id".to_string()))?;

    let mut tables = self.tables.lock();
    if let Some(existing) = tables.by_session.get(&session_id).and_then(|id| tables.orders.get(id)) {
      return Ok(InsertOutcome::AlreadyExists(existing.clone()));
    }

    let created = order.into_order(Uuid::new_v4(), Utc::now());
    tables.by_session.insert(session_id, created.id);
    tables.orders.insert(created.id, created.clone());
    Ok(InsertOutcome::Created(created))
  }

  async fn insert_manual(&self, mut order: NewOrder) -> StoreResult<Order> {
    order.session_id = None;
    let created = order.into_order(Uuid::new_v4(), Utc::now());
    self.tables.lock().orders.insert(created.id, created.clone());
    Ok(created)
  }

  async fn find_for_owner(&self, order_id: Uuid, user_id: &UserId) -> StoreResult<Option<Order>> {
    Ok(
      self
        .tables
        .lock()
        .orders
        .get(&order_id)
        .filter(|o| &o.user_id == user_id)
        .cloned(),
    )
  }

  async fn list_for_owner(&self, user_id: &UserId) -> StoreResult<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .tables
      .lock()
      .orders
      .values()
      .filter(|o| &o.user_id == user_id)
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(orders)
  }

  async fn transition_status(
    &self,
    order_id: Uuid,
    user_id: &UserId,
    expected: OrderStatus,
    next: OrderStatus,
    at: DateTime<Utc>,
  ) -> StoreResult<Option<Order>> {
    let mut tables = self.tables.lock();
    let Some(order) = tables
      .orders
      .get_mut(&order_id)
      .filter(|o| &o.user_id == user_id && o.status == expected)
    else {
      return Ok(None);
    };
    order.status = next;
    if next == OrderStatus::Completed {
      order.completed_at = Some(at);
    }
    Ok(Some(order.clone()))
  }
}
