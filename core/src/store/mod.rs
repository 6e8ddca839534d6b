// core/src/store/mod.rs

//! The Order Store contract: the single arbiter of "was this session already reconciled" and of
//! status transitions.
//!
//! Implementations must make `insert_if_absent` atomic on the session id and
//! `transition_status` a compare-and-swap on the current status. The reconciler holds no locks of
//! its own and may run as several instances against one store.

pub mod memory;

pub use memory::InMemoryOrderStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::error::CheckoutError;
use crate::model::identity::UserId;
use crate::model::order::{NewOrder, Order, OrderStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
  #[error("store unavailable: {0}")]
  Unavailable(String),

  /// A stored row could not be turned back into an order.
  #[error("stored order is corrupt: {0}")]
  Corrupt(String),

  #[error("store rejected the request: {0}")]
  Invalid(String),
}

impl From<StoreError> for CheckoutError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::Invalid(msg) => CheckoutError::Validation(msg),
      other => CheckoutError::StorageUnavailable(other.to_string()),
    }
  }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result of a create-if-absent keyed on the session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
  Created(Order),
  /// An order for this session already existed; it is returned unchanged.
  AlreadyExists(Order),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Creates the order unless one exists for `order.session_id`. A uniqueness violation is
  /// reported as [`InsertOutcome::AlreadyExists`], never as an error.
  ///
  /// `order.session_id` must be set; manual orders go through [`OrderStore::insert_manual`].
  async fn insert_if_absent(&self, order: NewOrder) -> StoreResult<InsertOutcome>;

  /// Creates an order without a payment session (test and manual orders).
  async fn insert_manual(&self, order: NewOrder) -> StoreResult<Order>;

  async fn find_for_owner(&self, order_id: Uuid, user_id: &UserId) -> StoreResult<Option<Order>>;

  /// The owner's orders, newest first.
  async fn list_for_owner(&self, user_id: &UserId) -> StoreResult<Vec<Order>>;

  /// Moves the order from `expected` to `next` if, and only if, it is owned by `user_id` and its
  /// current status is `expected`. Stamps `completed_at = at` when `next` is completed.
  /// Returns `None` when nothing matched.
  async fn transition_status(
    &self,
    order_id: Uuid,
    user_id: &UserId,
    expected: OrderStatus,
    next: OrderStatus,
    at: DateTime<Utc>,
  ) -> StoreResult<Option<Order>>;
}
