// storefront/tests/http_tests.rs

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use storefront::config::AppConfig;
use storefront::web::configure_app_routes;
use storefront::build_state;
use storefront::state::AppState;
use storefront_core::checkout::{PaymentProvider, ProviderSession, SessionRequest};
use storefront_core::model::{Money, NewOrder, Order, OrderStatus, UserId};
use storefront_core::webhook::signature_header;
use storefront_core::{
  CatalogProduct, InMemoryCatalog, InMemoryOrderStore, InsertOutcome, OrderStore, StoreError, StoreResult,
};

const WEBHOOK_SECRET: &str = "whsec_http_test";

#[derive(Default)]
struct FakeProvider {
  declines: bool,
}

#[async_trait]
impl PaymentProvider for FakeProvider {
  async fn create_checkout_session(&self, _request: &SessionRequest) -> anyhow::Result<ProviderSession> {
    if self.declines {
      anyhow::bail!("Stripe returned 402: card declined");
    }
    Ok(ProviderSession {
      id: "cs_fake_1".to_string(),
      url: Some("https://checkout.example/pay/cs_fake_1".to_string()),
      created_at: Utc::now(),
    })
  }
}

fn test_config() -> Arc<AppConfig> {
  let vars: HashMap<&str, &str> = HashMap::from([
    ("STORE_BACKEND", "memory"),
    ("APP_BASE_URL", "https://shop.example"),
    ("STRIPE_SECRET_KEY", "sk_test_123"),
    ("STRIPE_WEBHOOK_SECRET", WEBHOOK_SECRET),
  ]);
  Arc::new(AppConfig::from_lookup(|name: &str| vars.get(name).map(|v| v.to_string())).expect("test config"))
}

/// Every call fails as if the database were unreachable.
#[derive(Default)]
struct UnreachableStore {
  calls: AtomicUsize,
}

impl UnreachableStore {
  fn fail<T>(&self) -> StoreResult<T> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Err(StoreError::Unavailable("connection refused".to_string()))
  }
}

#[async_trait]
impl OrderStore for UnreachableStore {
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
    _at: chrono::DateTime<Utc>,
  ) -> StoreResult<Option<Order>> {
    self.fail()
  }
}

fn state_with(store: Arc<dyn OrderStore>, provider: FakeProvider) -> AppState {
  let catalog = Arc::new(InMemoryCatalog::new([CatalogProduct {
    id: "p1".to_string(),
    title: "Walnut Desk".to_string(),
    price: Money::from_cents(1_500),
    image: Some("/img/desk.png".to_string()),
  }]));
  build_state(test_config(), store, catalog, Arc::new(provider))
}

fn test_state() -> (AppState, Arc<InMemoryOrderStore>) {
  let store = Arc::new(InMemoryOrderStore::new());
  (state_with(store.clone(), FakeProvider::default()), store)
}

macro_rules! init_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

fn completed_event(session_id: &str, user_id: &str) -> Vec<u8> {
  serde_json::to_vec(&json!({
    "id": format!("evt_{}", session_id),
    "type": "checkout.session.completed",
    "created": 1_700_000_000,
    "data": { "object": {
      "id": session_id,
      "object": "checkout.session",
      "amount_total": 2000,
      "metadata": { "userId": user_id, "items": r#"[{"id":"p1","quantity":2,"price":10.0}]"# }
    }}
  }))
  .expect("event serializes")
}

fn webhook_request(body: Vec<u8>, secret: &str) -> test::TestRequest {
  let header = signature_header(secret, Utc::now().timestamp(), &body).expect("signs");
  test::TestRequest::post()
    .uri("/api/v1/webhooks/stripe")
    .insert_header(("Stripe-Signature", header))
    .set_payload(body)
}

fn as_user(req: test::TestRequest, user_id: &str) -> test::TestRequest {
  req.insert_header(("X-User-Id", user_id.to_string()))
}

fn cart_body() -> Value {
  json!({ "items": [{ "id": "p1", "title": "Walnut Desk", "price": 10.0, "quantity": 2, "image": "/img/desk.png" }] })
}

#[actix_web::test]
async fn health_reports_ok() {
  let (state, _) = test_state();
  let app = init_app!(state);
  let resp: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
  assert_eq!(resp, json!({ "status": "ok" }));
}

#[actix_web::test]
async fn checkout_without_identity_points_to_signin() {
  let (state, _) = test_state();
  let app = init_app!(state);
  let req = test::TestRequest::post().uri("/api/v1/checkout").set_json(cart_body()).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["redirectUrl"], "/auth/signin?callbackUrl=%2Fcheckout");
}

#[actix_web::test]
async fn anonymous_checkout_is_sent_to_signin_even_with_a_malformed_body() {
  let (state, _) = test_state();
  let app = init_app!(state);
  let req = test::TestRequest::post()
    .uri("/api/v1/checkout")
    .insert_header(("Content-Type", "application/json"))
    .set_payload("{\"items\": 12")
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["redirectUrl"], "/auth/signin?callbackUrl=%2Fcheckout");
}

#[actix_web::test]
async fn declined_session_build_points_to_signin() {
  let state = state_with(Arc::new(InMemoryOrderStore::new()), FakeProvider { declines: true });
  let app = init_app!(state);
  let req = as_user(test::TestRequest::post().uri("/api/v1/checkout").set_json(cart_body()), "user_1").to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["redirectUrl"], "/auth/signin?callbackUrl=%2Fcheckout");
  assert!(body.get("url").is_none());
}

#[actix_web::test]
async fn checkout_returns_provider_url() {
  let (state, _) = test_state();
  let app = init_app!(state);
  let req = as_user(test::TestRequest::post().uri("/api/v1/checkout").set_json(cart_body()), "user_1").to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["url"], "https://checkout.example/pay/cs_fake_1");
}

#[actix_web::test]
async fn checkout_rejects_empty_and_malformed_carts() {
  let (state, _) = test_state();
  let app = init_app!(state);

  let empty = as_user(
    test::TestRequest::post().uri("/api/v1/checkout").set_json(json!({ "items": [] })),
    "user_1",
  );
  assert_eq!(test::call_service(&app, empty.to_request()).await.status(), StatusCode::BAD_REQUEST);

  let malformed = as_user(
    test::TestRequest::post()
      .uri("/api/v1/checkout")
      .insert_header(("Content-Type", "application/json"))
      .set_payload("{\"items\": 12"),
    "user_1",
  );
  assert_eq!(test::call_service(&app, malformed.to_request()).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn webhook_creates_one_order_across_redeliveries() {
  let (state, store) = test_state();
  let app = init_app!(state);

  for _ in 0..3 {
    let resp = test::call_service(&app, webhook_request(completed_event("cs_1", "user_1"), WEBHOOK_SECRET).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "received": true }));
  }
  assert_eq!(store.orders_for_session("cs_1").len(), 1);
}

#[actix_web::test]
async fn webhook_rejects_bad_signatures_without_side_effects() {
  let (state, store) = test_state();
  let app = init_app!(state);

  let forged = webhook_request(completed_event("cs_2", "user_1"), "whsec_wrong");
  assert_eq!(test::call_service(&app, forged.to_request()).await.status(), StatusCode::BAD_REQUEST);

  let unsigned = test::TestRequest::post()
    .uri("/api/v1/webhooks/stripe")
    .set_payload(completed_event("cs_2", "user_1"));
  assert_eq!(test::call_service(&app, unsigned.to_request()).await.status(), StatusCode::BAD_REQUEST);

  assert!(store.is_empty());
}

#[actix_web::test]
async fn webhook_asks_for_redelivery_while_the_store_is_down() {
  let store = Arc::new(UnreachableStore::default());
  let state = state_with(store.clone(), FakeProvider::default());
  let app = init_app!(state);

  let resp = test::call_service(&app, webhook_request(completed_event("cs_down", "user_1"), WEBHOOK_SECRET).to_request()).await;
  assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
  assert!(!resp.status().is_success());
  assert!(store.calls.load(Ordering::SeqCst) >= 1);
}

#[actix_web::test]
async fn webhook_acknowledges_unhandled_event_types() {
  let (state, store) = test_state();
  let app = init_app!(state);
  let body = serde_json::to_vec(&json!({
    "id": "evt_refund",
    "type": "charge.refunded",
    "data": { "object": { "id": "ch_1" } }
  }))
  .expect("serializes");
  let resp = test::call_service(&app, webhook_request(body, WEBHOOK_SECRET).to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert!(store.is_empty());
}

#[actix_web::test]
async fn orders_are_listed_detailed_and_completed_by_their_owner_only() {
  let (state, _) = test_state();
  let app = init_app!(state);
  test::call_service(&app, webhook_request(completed_event("cs_3", "user_1"), WEBHOOK_SECRET).to_request()).await;

  let listed: Value = test::call_and_read_body_json(
    &app,
    as_user(test::TestRequest::get().uri("/api/v1/orders"), "user_1").to_request(),
  )
  .await;
  let orders = listed["orders"].as_array().expect("orders array");
  assert_eq!(orders.len(), 1);
  assert_eq!(orders[0]["status"], "pending");
  assert_eq!(orders[0]["total"], 20.0);
  let order_id = orders[0]["id"].as_str().expect("order id").to_string();

  let others: Value = test::call_and_read_body_json(
    &app,
    as_user(test::TestRequest::get().uri("/api/v1/orders"), "user_2").to_request(),
  )
  .await;
  assert_eq!(others["orders"], json!([]));

  let detail: Value = test::call_and_read_body_json(
    &app,
    as_user(test::TestRequest::get().uri(&format!("/api/v1/orders/{}", order_id)), "user_1").to_request(),
  )
  .await;
  assert_eq!(detail["lines"][0]["title"], "Walnut Desk");
  assert_eq!(detail["lines"][0]["unitPriceAtPurchase"], 10.0);

  let complete_uri = format!("/api/v1/orders/{}/complete", order_id);
  let stranger = as_user(test::TestRequest::post().uri(&complete_uri), "user_2");
  let resp = test::call_service(&app, stranger.to_request()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "Order not found or unauthorized");

  let resp = test::call_service(&app, as_user(test::TestRequest::post().uri(&complete_uri), "user_1").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["message"], "Order marked as completed");
  assert_eq!(body["order"]["status"], "completed");

  let again = test::call_service(&app, as_user(test::TestRequest::post().uri(&complete_uri), "user_1").to_request()).await;
  assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn order_routes_require_identity() {
  let (state, _) = test_state();
  let app = init_app!(state);
  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/orders").to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
