// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use storefront_core::{ContextData, PipelineResult};

use crate::errors::AppError;
use crate::pipelines::contexts::{CompleteOrderCtxData, OrderLookupCtxData, OrderQuery};
use crate::state::AppState;
use crate::web::handlers::AuthenticatedUser;

fn halted() -> AppError {
  AppError::Internal("Order request was halted.".to_string())
}

#[instrument(
  name = "handler::complete_order",
  skip_all,
  fields(user_id = %auth_user.id(), order_id = %path)
)]
pub async fn complete_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let ctx = ContextData::new(CompleteOrderCtxData {
    app_state: app_state.get_ref().clone(),
    user_id: auth_user.id().clone(),
    order_id: path.into_inner(),
    completed_order: None,
  });

  if app_state.registry.run(ctx.clone()).await? == PipelineResult::Stopped {
    return Err(halted());
  }
  let order = ctx
    .read()
    .completed_order
    .clone()
    .ok_or_else(|| AppError::Internal("completion finished without an order".to_string()))?;
  info!(order_id = %order.id, "Order marked as completed.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Order marked as completed", "order": order })))
}

async fn lookup(app_state: &AppState, auth_user: &AuthenticatedUser, query: OrderQuery) -> Result<OrderLookupCtxData, AppError> {
  let ctx = ContextData::new(OrderLookupCtxData {
    app_state: app_state.clone(),
    user_id: auth_user.id().clone(),
    query,
    orders: Vec::new(),
    detail: None,
  });
  if app_state.registry.run(ctx.clone()).await? == PipelineResult::Stopped {
    return Err(halted());
  }
  Ok(ctx.snapshot())
}

#[instrument(name = "handler::list_orders", skip_all, fields(user_id = %auth_user.id()))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let result = lookup(&app_state, &auth_user, OrderQuery::All).await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": result.orders })))
}

#[instrument(
  name = "handler::get_order",
  skip_all,
  fields(user_id = %auth_user.id(), order_id = %path)
)]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let result = lookup(&app_state, &auth_user, OrderQuery::Detail(path.into_inner())).await?;
  let detail = result
    .detail
    .ok_or_else(|| AppError::Internal("order lookup finished without a result".to_string()))?;
  Ok(HttpResponse::Ok().json(detail))
}
