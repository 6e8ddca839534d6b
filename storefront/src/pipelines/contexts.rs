// storefront/src/pipelines/contexts.rs

//! Per-request data the pipelines run on. Handlers receive these wrapped in `ContextData`.

use actix_web::web::Bytes;
use uuid::Uuid;

use storefront_core::model::{Cart, Order, UserId, UserIdentity};
use storefront_core::{BuiltSession, OrderDetail, ReconcileOutcome, VerifiedEvent};

use crate::state::AppState;

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub identity: UserIdentity,
  pub cart: Cart,
  pub built_session: Option<BuiltSession>,
}

#[derive(Clone)]
pub struct WebhookCtxData {
  pub app_state: AppState,
  /// The body exactly as received; verification runs over these bytes.
  pub raw_payload: Bytes,
  pub signature_header: Option<String>,
  pub event: Option<VerifiedEvent>,
  pub outcome: Option<ReconcileOutcome>,
}

impl WebhookCtxData {
  pub fn is_payment_completed(&self) -> bool {
    self.event.as_ref().is_some_and(VerifiedEvent::is_payment_completed)
  }
}

#[derive(Clone)]
pub struct CompleteOrderCtxData {
  pub app_state: AppState,
  pub user_id: UserId,
  pub order_id: Uuid,
  pub completed_order: Option<Order>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderQuery {
  All,
  Detail(Uuid),
}

#[derive(Clone)]
pub struct OrderLookupCtxData {
  pub app_state: AppState,
  pub user_id: UserId,
  pub query: OrderQuery,
  pub orders: Vec<Order>,
  pub detail: Option<OrderDetail>,
}
