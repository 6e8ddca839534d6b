// storefront/src/pipelines/mod.rs

//! Defines and registers the pipelines behind every HTTP flow.

use crate::errors::AppError;
use storefront_core::PipelineRegistry;

pub mod contexts;

pub mod checkout_pipeline;
pub mod order_pipeline;
pub mod webhook_pipeline;

/// Registers all pipelines with `registry`. Called once at startup, before the server binds.
pub fn register_all_pipelines(registry: &PipelineRegistry<AppError>) {
  tracing::info!("Registering pipelines...");

  checkout_pipeline::register_checkout_pipeline(registry);
  webhook_pipeline::register_webhook_pipeline(registry);
  order_pipeline::register_complete_order_pipeline(registry);
  order_pipeline::register_order_lookup_pipeline(registry);

  tracing::info!("All pipelines registered.");
}
