// storefront/src/lib.rs

//! HTTP storefront checkout service: hosted payment sessions in, reconciled orders out.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod web;

use std::sync::Arc;

use storefront_core::{
  CatalogReader, OrderReconciler, OrderStore, PaymentProvider, PaymentSessionBuilder, PipelineRegistry,
  SessionSettings, WebhookVerifier,
};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::state::AppState;

/// Wires the collaborators into an [`AppState`] and registers every pipeline.
pub fn build_state(
  config: Arc<AppConfig>,
  store: Arc<dyn OrderStore>,
  catalog: Arc<dyn CatalogReader>,
  provider: Arc<dyn PaymentProvider>,
) -> AppState {
  let registry = Arc::new(PipelineRegistry::<AppError>::new());
  pipelines::register_all_pipelines(&registry);

  let session_builder = PaymentSessionBuilder::new(
    provider,
    SessionSettings {
      public_base_url: config.app_base_url.clone(),
      currency: config.checkout_currency.clone(),
    },
  );

  AppState {
    registry,
    reconciler: Arc::new(OrderReconciler::new(store, config.store_timeout)),
    session_builder: Arc::new(session_builder),
    verifier: Arc::new(WebhookVerifier::new(
      config.stripe_webhook_secret.clone(),
      config.webhook_tolerance_secs,
    )),
    catalog,
    config,
  }
}
