// storefront/src/pipelines/checkout_pipeline.rs
use crate::errors::AppError;
use crate::pipelines::contexts::CheckoutCtxData;
use storefront_core::{CheckoutError, ContextData, Pipeline, PipelineControl, PipelineRegistry};
use tracing::{info, warn};

pub fn register_checkout_pipeline(registry: &PipelineRegistry<AppError>) {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&[
    ("validate_cart", false, None),
    ("create_payment_session", false, None),
  ]);

  // Step 1: Reject unusable carts before anything reaches the provider.
  p.on_root("validate_cart", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      match guard.cart.validated_lines() {
        Ok(lines) => {
          info!(user_id = %guard.identity.id, lines = lines.len(), "Checkout Pipeline: cart accepted.");
          Ok(PipelineControl::Continue)
        }
        Err(e) => {
          warn!(user_id = %guard.identity.id, error = %e, "Checkout Pipeline: cart rejected.");
          Err::<_, CheckoutError>(e)
        }
      }
    })
  });

  // Step 2: Register the hosted checkout session and keep the redirect.
  p.on_root("create_payment_session", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (builder, identity, cart) = {
        let guard = ctx_data.read();
        (
          guard.app_state.session_builder.clone(),
          guard.identity.clone(),
          guard.cart.clone(),
        )
      };

      let built = builder.build_session(&identity, cart).await?;
      info!(
        user_id = %identity.id,
        session_id = %built.redirect.session_id,
        "Checkout Pipeline: payment session created."
      );
      ctx_data.write().built_session = Some(built);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
}
