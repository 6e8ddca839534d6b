// storefront/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use storefront_core::webhook::SIGNATURE_HEADER;
use storefront_core::{ContextData, PipelineResult};

use crate::errors::AppError;
use crate::pipelines::contexts::WebhookCtxData;
use crate::state::AppState;

/// Receives provider events. The body is taken as raw bytes and never re-serialised before
/// verification.
#[instrument(name = "handler::stripe_webhook", skip_all, fields(payload_len = body.len()))]
pub async fn stripe_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature_header = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|h| h.to_str().ok())
    .map(String::from);

  let ctx = ContextData::new(WebhookCtxData {
    app_state: app_state.get_ref().clone(),
    raw_payload: body,
    signature_header,
    event: None,
    outcome: None,
  });

  match app_state.registry.run(ctx.clone()).await? {
    PipelineResult::Completed | PipelineResult::Stopped => {
      info!("Webhook delivery acknowledged.");
      Ok(HttpResponse::Ok().json(json!({ "received": true })))
    }
  }
}
