// core/src/reconciler.rs

//! Order Reconciler: the order lifecycle state machine.
//!
//! Two independent triggers drive it:
//! - a verified `checkout.session.completed` event creates a pending order exactly once per
//!   session id, with the total and unit prices frozen from the event;
//! - an owner's completion request moves pending to completed through a compare-and-swap.
//!
//! All cross-request state lives in the [`OrderStore`]; every store call is bounded by
//! `store_timeout` and a timeout is reported as [`CheckoutError::StorageUnavailable`].

use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::catalog::CatalogReader;
use crate::error::{CheckoutError, CheckoutResult};
use crate::model::identity::UserId;
use crate::model::money::Money;
use crate::model::order::{NewOrder, Order, OrderItem, OrderStatus};
use crate::model::session::{LineItemProjection, METADATA_ITEMS_KEY, METADATA_USER_ID_KEY};
use crate::store::{InsertOutcome, OrderStore, StoreResult};
use crate::webhook::{CheckoutSessionObject, EventKind, VerifiedEvent};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
  Created(Order),
  /// The session was already reconciled; nothing was written.
  Duplicate(Order),
  /// The event type does not concern orders; acknowledged and dropped.
  Ignored { event_type: String },
}

/// An order line with display data from the current catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailLine {
  pub product_id: String,
  pub quantity: u32,
  pub unit_price_at_purchase: Money,
  pub line_total: Money,
  pub title: Option<String>,
  pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
  #[serde(flatten)]
  pub order: Order,
  pub lines: Vec<OrderDetailLine>,
}

pub struct OrderReconciler {
  store: Arc<dyn OrderStore>,
  store_timeout: Duration,
}

impl OrderReconciler {
  pub fn new(store: Arc<dyn OrderStore>, store_timeout: Duration) -> Self {
    Self { store, store_timeout }
  }

  pub fn store_timeout(&self) -> Duration {
    self.store_timeout
  }

  async fn bounded<T>(&self, op: &'static str, fut: impl Future<Output = StoreResult<T>>) -> CheckoutResult<T> {
    match tokio::time::timeout(self.store_timeout, fut).await {
      Ok(Ok(value)) => Ok(value),
      Ok(Err(store_err)) => {
        error!(operation = op, error = %store_err, "Order store operation failed.");
        Err(store_err.into())
      }
      Err(_) => {
        error!(operation = op, timeout_ms = self.store_timeout.as_millis() as u64, "Order store operation timed out.");
        Err(CheckoutError::StorageUnavailable(format!(
          "{} timed out after {}ms",
          op,
          self.store_timeout.as_millis()
        )))
      }
    }
  }

  /// Routes a verified event: payment completions are reconciled, everything else is ignored.
  #[instrument(name = "reconciler::handle_event", skip_all, fields(event_id = %event.id, event_type = %event.event_type))]
  pub async fn handle_event(&self, event: &VerifiedEvent) -> CheckoutResult<ReconcileOutcome> {
    match &event.kind {
      EventKind::PaymentCompleted => {
        let session = event.checkout_session()?;
        self.reconcile_payment(&session).await
      }
      EventKind::Other(event_type) => {
        info!("Ignoring event type.");
        Ok(ReconcileOutcome::Ignored {
          event_type: event_type.clone(),
        })
      }
    }
  }

  /// Creates the pending order for a completed checkout session, once.
  ///
  /// Redeliveries and concurrent duplicates resolve to [`ReconcileOutcome::Duplicate`] through the
  /// store's uniqueness on the session id. Metadata problems are terminal
  /// ([`CheckoutError::MetadataMissing`]); storage problems propagate so the delivery is retried.
  #[instrument(name = "reconciler::reconcile_payment", skip_all, fields(session_id = %session.id))]
  pub async fn reconcile_payment(&self, session: &CheckoutSessionObject) -> CheckoutResult<ReconcileOutcome> {
    let new_order = new_order_from_session(session).inspect_err(|e| {
      warn!(error = %e, "Rejecting payment event with unusable metadata.");
    })?;

    let outcome = self
      .bounded("insert_if_absent", self.store.insert_if_absent(new_order))
      .await?;

    match outcome {
      InsertOutcome::Created(order) => {
        info!(order_id = %order.id, user_id = %order.user_id, total = %order.total, items = order.items.len(), "Order created from payment.");
        Ok(ReconcileOutcome::Created(order))
      }
      InsertOutcome::AlreadyExists(order) => {
        info!(order_id = %order.id, "Payment already reconciled; duplicate delivery acknowledged.");
        Ok(ReconcileOutcome::Duplicate(order))
      }
    }
  }

  /// Marks the caller's pending order as completed.
  ///
  /// A missing order, an order owned by someone else, and an order that is not pending all yield
  /// [`CheckoutError::NotFound`], so callers cannot probe for other users' orders.
  #[instrument(name = "reconciler::complete_order", skip_all, fields(order_id = %order_id, user_id = %user_id))]
  pub async fn complete_order(&self, order_id: Uuid, user_id: &UserId) -> CheckoutResult<Order> {
    let updated = self
      .bounded(
        "transition_status",
        self.store.transition_status(
          order_id,
          user_id,
          OrderStatus::Pending,
          OrderStatus::Completed,
          Utc::now(),
        ),
      )
      .await?;

    match updated {
      Some(order) => {
        info!("Order marked as completed.");
        Ok(order)
      }
      None => {
        info!("Completion rejected: order missing, not owned, or not pending.");
        Err(CheckoutError::NotFound)
      }
    }
  }

  #[instrument(name = "reconciler::order_for_owner", skip_all, fields(order_id = %order_id, user_id = %user_id))]
  pub async fn order_for_owner(&self, order_id: Uuid, user_id: &UserId) -> CheckoutResult<Order> {
    self
      .bounded("find_for_owner", self.store.find_for_owner(order_id, user_id))
      .await?
      .ok_or(CheckoutError::NotFound)
  }

  #[instrument(name = "reconciler::orders_for_owner", skip_all, fields(user_id = %user_id))]
  pub async fn orders_for_owner(&self, user_id: &UserId) -> CheckoutResult<Vec<Order>> {
    self.bounded("list_for_owner", self.store.list_for_owner(user_id)).await
  }

  /// The owner's order with current catalog titles and images attached for display.
  ///
  /// Prices always come from the order. A catalog failure only leaves display fields empty.
  #[instrument(name = "reconciler::order_detail", skip_all, fields(order_id = %order_id, user_id = %user_id))]
  pub async fn order_detail(
    &self,
    order_id: Uuid,
    user_id: &UserId,
    catalog: &dyn CatalogReader,
  ) -> CheckoutResult<OrderDetail> {
    let order = self.order_for_owner(order_id, user_id).await?;
    let ids: Vec<String> = order.items.iter().map(|i| i.product_id.clone()).collect();

    let products = match tokio::time::timeout(self.store_timeout, catalog.products_by_ids(&ids)).await {
      Ok(Ok(products)) => products.into_iter().map(|p| (p.id.clone(), p)).collect(),
      Ok(Err(e)) => {
        warn!(error = %e, "Catalog lookup failed; returning order without display data.");
        HashMap::new()
      }
      Err(_) => {
        warn!("Catalog lookup timed out; returning order without display data.");
        HashMap::new()
      }
    };

    let lines = order
      .items
      .iter()
      .map(|item| {
        let product = products.get(&item.product_id);
        OrderDetailLine {
          product_id: item.product_id.clone(),
          quantity: item.quantity,
          unit_price_at_purchase: item.unit_price_at_purchase,
          line_total: item
            .unit_price_at_purchase
            .checked_mul(item.quantity)
            .unwrap_or(item.unit_price_at_purchase),
          title: product.map(|p| p.title.clone()),
          image: product.and_then(|p| p.image.clone()),
        }
      })
      .collect();

    Ok(OrderDetail { order, lines })
  }

  /// Records an order that did not go through the payment provider (test and manual orders).
  /// The total is the sum of the given lines.
  #[instrument(name = "reconciler::record_manual_order", skip_all, fields(user_id = %user_id, items = items.len()))]
  pub async fn record_manual_order(&self, user_id: &UserId, items: Vec<OrderItem>) -> CheckoutResult<Order> {
    if items.is_empty() {
      return Err(CheckoutError::Validation("manual order needs at least one item".to_string()));
    }
    if items.iter().any(|i| i.quantity == 0 || i.unit_price_at_purchase < Money::ZERO) {
      return Err(CheckoutError::Validation(
        "manual order items need a positive quantity and a non-negative price".to_string(),
      ));
    }
    let total = items
      .iter()
      .try_fold(0i64, |acc, i| {
        i.unit_price_at_purchase
          .checked_mul(i.quantity)
          .and_then(|line| acc.checked_add(line.cents()))
      })
      .map(Money::from_cents)
      .ok_or_else(|| CheckoutError::Validation("manual order total overflows".to_string()))?;

    let order = self
      .bounded(
        "insert_manual",
        self.store.insert_manual(NewOrder {
          user_id: user_id.clone(),
          session_id: None,
          total,
          items,
        }),
      )
      .await?;
    info!(order_id = %order.id, "Manual order recorded.");
    Ok(order)
  }
}

fn metadata_missing(reason: impl Into<String>) -> CheckoutError {
  CheckoutError::MetadataMissing(reason.into())
}

/// Builds the order to create from a completed checkout session.
///
/// The total is the provider-reported `amount_total`; unit prices come from the line-item
/// projection in the session metadata. Nothing is looked up in the catalog.
pub fn new_order_from_session(session: &CheckoutSessionObject) -> CheckoutResult<NewOrder> {
  let metadata = session
    .metadata
    .as_ref()
    .ok_or_else(|| metadata_missing("session has no metadata"))?;

  let user_id = metadata
    .get(METADATA_USER_ID_KEY)
    .map(|s| s.trim())
    .filter(|s| !s.is_empty())
    .ok_or_else(|| metadata_missing("metadata has no userId"))?;

  let raw_items = metadata
    .get(METADATA_ITEMS_KEY)
    .ok_or_else(|| metadata_missing("metadata has no items"))?;

  let projection: Vec<LineItemProjection> =
    serde_json::from_str(raw_items).map_err(|e| metadata_missing(format!("invalid items JSON: {}", e)))?;
  if projection.is_empty() {
    return Err(metadata_missing("metadata items are empty"));
  }

  let items = projection
    .into_iter()
    .map(|p| {
      let quantity = u32::try_from(p.quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| metadata_missing(format!("item '{}' has invalid quantity {}", p.id, p.quantity)))?;
      let unit_price = Money::from_major(p.price)
        .filter(|m| *m >= Money::ZERO)
        .ok_or_else(|| metadata_missing(format!("item '{}' has invalid price {}", p.id, p.price)))?;
      if p.id.trim().is_empty() {
        return Err(metadata_missing("item without product id"));
      }
      Ok(OrderItem {
        product_id: p.id,
        quantity,
        unit_price_at_purchase: unit_price,
      })
    })
    .collect::<CheckoutResult<Vec<_>>>()?;

  let total = session
    .amount_total
    .filter(|amount| *amount >= 0)
    .map(Money::from_cents)
    .ok_or_else(|| metadata_missing("session has no amount_total"))?;

  Ok(NewOrder {
    user_id: UserId::new(user_id),
    session_id: Some(session.id.clone()),
    total,
    items,
  })
}
