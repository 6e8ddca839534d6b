// storefront/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use std::sync::Arc;
use storefront_core::{CatalogReader, OrderReconciler, PaymentSessionBuilder, PipelineRegistry, WebhookVerifier};

/// Shared, immutable per-process collaborators. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
  pub registry: Arc<PipelineRegistry<AppError>>,
  pub reconciler: Arc<OrderReconciler>,
  pub session_builder: Arc<PaymentSessionBuilder>,
  pub verifier: Arc<WebhookVerifier>,
  pub catalog: Arc<dyn CatalogReader>,
  pub config: Arc<AppConfig>,
}
