// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use storefront_core::checkout::{PaymentProvider, ProviderSession, SessionRequest};
use storefront_core::model::{NewOrder, Order, OrderStatus, UserId};
use storefront_core::store::{InMemoryOrderStore, InsertOutcome, OrderStore, StoreError, StoreResult};
use storefront_core::webhook::signature_header;
use storefront_core::{ContextData, PipelineControl, PipelineError};

pub const SECRET: &str = "whsec_test_secret";

// --- Tracing ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Webhook fixtures ---

/// A `checkout.session.completed` body with the given metadata `items` string.
pub fn completed_event_body(session_id: &str, user_id: &str, items_json: &str, amount_total: i64) -> Vec<u8> {
  serde_json::to_vec(&serde_json::json!({
    "id": format!("evt_{}", session_id),
    "type": "checkout.session.completed",
    "created": 1_700_000_000,
    "data": {
      "object": {
        "id": session_id,
        "object": "checkout.session",
        "amount_total": amount_total,
        "currency": "usd",
        "metadata": { "userId": user_id, "items": items_json }
      }
    }
  }))
  .expect("fixture serializes")
}

pub fn signed(body: &[u8], at: DateTime<Utc>) -> String {
  signature_header(SECRET, at.timestamp(), body).expect("fixture signs")
}

// --- Payment provider double ---

#[derive(Default)]
pub struct RecordingProvider {
  pub requests: Mutex<Vec<SessionRequest>>,
  pub fail_with: Mutex<Option<String>>,
  pub omit_url: AtomicBool,
}

#[async_trait]
impl PaymentProvider for RecordingProvider {
  async fn create_checkout_session(&self, request: &SessionRequest) -> anyhow::Result<ProviderSession> {
    self.requests.lock().push(request.clone());
    if let Some(msg) = self.fail_with.lock().clone() {
      anyhow::bail!(msg);
    }
    let id = format!("cs_test_{}", Uuid::new_v4().simple());
    let url = (!self.omit_url.load(Ordering::SeqCst)).then(|| format!("https://checkout.example/pay/{}", id));
    Ok(ProviderSession {
      id,
      url,
      created_at: Utc::now(),
    })
  }
}

// --- Store doubles ---

/// Delays every call, to exercise the reconciler's timeout.
pub struct SlowStore {
  pub inner: InMemoryOrderStore,
  pub delay: Duration,
}

#[async_trait]
impl OrderStore for SlowStore {
  async fn insert_if_absent(&self, order: NewOrder) -> StoreResult<InsertOutcome> {
    tokio::time::sleep(self.delay).await;
    self.inner.insert_if_absent(order).await
  }

  async fn insert_manual(&self, order: NewOrder) -> StoreResult<Order> {
    tokio::time::sleep(self.delay).await;
    self.inner.insert_manual(order).await
  }

  async fn find_for_owner(&self, order_id: Uuid, user_id: &UserId) -> StoreResult<Option<Order>> {
    tokio::time::sleep(self.delay).await;
    self.inner.find_for_owner(order_id, user_id).await
  }

  async fn list_for_owner(&self, user_id: &UserId) -> StoreResult<Vec<Order>> {
    tokio::time::sleep(self.delay).await;
    self.inner.list_for_owner(user_id).await
  }

  async fn transition_status(
    &self,
    order_id: Uuid,
    user_id: &UserId,
    expected: OrderStatus,
    next: OrderStatus,
    at: DateTime<Utc>,
  ) -> StoreResult<Option<Order>> {
    tokio::time::sleep(self.delay).await;
    self.inner.transition_status(order_id, user_id, expected, next, at).await
  }
}

/// Fails every call as an unreachable database would, counting attempts.
#[derive(Default)]
pub struct DownStore {
  pub calls: AtomicUsize,
}

impl DownStore {
  fn fail<T>(&self) -> StoreResult<T> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Err(StoreError::Unavailable("connection refused".to_string()))
  }
}

#[async_trait]
impl OrderStore for DownStore {
  async fn insert_if_absent(&self, _order: NewOrder) -> StoreResult<InsertOutcome> {
    self.fail()
  }

  async fn insert_manual(&self, _order: NewOrder) -> StoreResult<Order> {
    self.fail()
  }

  async fn find_for_owner(&self, _order_id: Uuid, _user_id: &UserId) -> StoreResult<Option<Order>> {
    self.fail()
  }

  async fn list_for_owner(&self, _user_id: &UserId) -> StoreResult<Vec<Order>> {
    self.fail()
  }

  async fn transition_status(
    &self,
    _order_id: Uuid,
    _user_id: &UserId,
    _expected: OrderStatus,
    _next: OrderStatus,
    _at: DateTime<Utc>,
  ) -> StoreResult<Option<Order>> {
    self.fail()
  }
}

// --- Pipeline fixtures ---

#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
  pub skip_audit: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("pipeline error: {0}")]
  Pipeline(String),

  #[error("handler failed: {0}")]
  Handler(String),
}

impl From<PipelineError> for TestError {
  fn from(err: PipelineError) -> Self {
    TestError::Pipeline(format!("{:?}", err))
  }
}

pub fn recording_handler(
  label: &'static str,
) -> impl Fn(ContextData<TestContext>) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<PipelineControl, TestError>> + Send>>
     + Send
     + Sync
     + 'static {
  move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.steps_executed.push(label.to_string());
      if guard.should_stop_at.as_deref() == Some(label) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  }
}

pub fn shared<T>(value: T) -> Arc<T> {
  Arc::new(value)
}
