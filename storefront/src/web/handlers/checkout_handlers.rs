// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument, warn};

use storefront_core::model::Cart;
use storefront_core::{ContextData, PipelineResult};

use crate::errors::{AppError, CHECKOUT_SIGNIN_REDIRECT};
use crate::pipelines::contexts::CheckoutCtxData;
use crate::state::AppState;
use crate::web::handlers::AuthenticatedUser;

#[instrument(
  name = "handler::start_checkout",
  skip_all,
  fields(user_id = ?auth_user.as_ref().map(|u| u.id().to_string()), payload_len = body.len())
)]
pub async fn start_checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: Option<AuthenticatedUser>,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  // Identity first: an anonymous caller is sent to sign in whatever the body holds.
  let Some(auth_user) = auth_user else {
    return Err(AppError::Unauthenticated {
      redirect_url: Some(CHECKOUT_SIGNIN_REDIRECT.to_string()),
    });
  };
  let cart: Cart =
    serde_json::from_slice(&body).map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))?;

  let ctx = ContextData::new(CheckoutCtxData {
    app_state: app_state.get_ref().clone(),
    identity: auth_user.into_identity(),
    cart,
    built_session: None,
  });

  match app_state.registry.run(ctx.clone()).await? {
    PipelineResult::Completed => {
      let built = ctx
        .read()
        .built_session
        .clone()
        .ok_or_else(|| AppError::Internal("checkout completed without a session".to_string()))?;
      info!(session_id = %built.redirect.session_id, "Checkout session ready, redirecting client.");
      Ok(HttpResponse::Ok().json(json!({ "url": built.redirect.redirect_url })))
    }
    PipelineResult::Stopped => {
      warn!("Checkout pipeline was stopped by a handler.");
      Err(AppError::Internal("Checkout was halted.".to_string()))
    }
  }
}
