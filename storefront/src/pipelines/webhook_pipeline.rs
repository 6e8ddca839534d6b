// storefront/src/pipelines/webhook_pipeline.rs

//! Provider callbacks: verify, route, reconcile, acknowledge.
//!
//! Every delivery, including redeliveries and events we do not care about, ends in a 2xx unless
//! verification fails (4xx, never retried usefully) or the store is unavailable (5xx, so the
//! provider redelivers later).

use crate::errors::AppError;
use crate::pipelines::contexts::WebhookCtxData;
use storefront_core::{skip_when, ContextData, Pipeline, PipelineControl, PipelineRegistry, ReconcileOutcome};
use tracing::{info, warn};

pub fn register_webhook_pipeline(registry: &PipelineRegistry<AppError>) {
  let mut p = Pipeline::<WebhookCtxData, AppError>::new(&[
    ("verify_signature", false, None),
    ("route_event", false, None),
    (
      "reconcile_payment",
      false,
      skip_when(|ctx: &WebhookCtxData| !ctx.is_payment_completed()),
    ),
    ("acknowledge_receipt", true, None),
  ]);

  // Step 1: Authenticate the raw bytes and decode the event.
  p.on_root("verify_signature", |ctx_data: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let (verifier, raw_payload, signature_header) = {
        let guard = ctx_data.read();
        (
          guard.app_state.verifier.clone(),
          guard.raw_payload.clone(),
          guard.signature_header.clone(),
        )
      };

      let event = verifier.verify(&raw_payload, signature_header.as_deref())?;
      info!(event_id = %event.id, event_type = %event.event_type, "Webhook Pipeline: event verified.");
      ctx_data.write().event = Some(event);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 2: Anything but a completed checkout is acknowledged and dropped here.
  p.on_root("route_event", |ctx_data: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let Some(event) = guard.event.as_ref() else {
        return Err(AppError::Internal("route_event ran before verification".to_string()));
      };
      if !event.is_payment_completed() {
        let event_type = event.event_type.clone();
        info!(%event_type, "Webhook Pipeline: event type not handled, acknowledging.");
        guard.outcome = Some(ReconcileOutcome::Ignored { event_type });
      }
      Ok(PipelineControl::Continue)
    })
  });

  // Step 3: Create the order, once per session.
  p.on_root("reconcile_payment", |ctx_data: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let (reconciler, event) = {
        let guard = ctx_data.read();
        (guard.app_state.reconciler.clone(), guard.event.clone())
      };
      let event = event.ok_or_else(|| AppError::Internal("reconcile_payment ran without an event".to_string()))?;

      let outcome = reconciler.handle_event(&event).await.inspect_err(|e| {
        if e.is_retryable() {
          warn!(event_id = %event.id, error = %e, "Webhook Pipeline: storage unavailable, delivery will be retried.");
        }
      })?;
      ctx_data.write().outcome = Some(outcome);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("acknowledge_receipt", |ctx_data: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      let event_id = guard.event.as_ref().map(|e| e.id.as_str()).unwrap_or_default();
      match &guard.outcome {
        Some(ReconcileOutcome::Created(order)) => {
          info!(%event_id, order_id = %order.id, "Webhook Pipeline: acknowledged, order created.")
        }
        Some(ReconcileOutcome::Duplicate(order)) => {
          info!(%event_id, order_id = %order.id, "Webhook Pipeline: acknowledged duplicate delivery.")
        }
        Some(ReconcileOutcome::Ignored { event_type }) => {
          info!(%event_id, %event_type, "Webhook Pipeline: acknowledged ignored event.")
        }
        None => warn!(%event_id, "Webhook Pipeline: acknowledging without an outcome."),
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
}
