// storefront/src/pipelines/order_pipeline.rs
use crate::errors::AppError;
use crate::pipelines::contexts::{CompleteOrderCtxData, OrderLookupCtxData, OrderQuery};
use storefront_core::{ContextData, Pipeline, PipelineControl, PipelineRegistry};
use tracing::info;

pub fn register_complete_order_pipeline(registry: &PipelineRegistry<AppError>) {
  let mut p = Pipeline::<CompleteOrderCtxData, AppError>::new(&[("complete_order", false, None)]);

  p.on_root("complete_order", |ctx_data: ContextData<CompleteOrderCtxData>| {
    Box::pin(async move {
      let (reconciler, order_id, user_id) = {
        let guard = ctx_data.read();
        (guard.app_state.reconciler.clone(), guard.order_id, guard.user_id.clone())
      };

      let order = reconciler.complete_order(order_id, &user_id).await?;
      ctx_data.write().completed_order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
}

pub fn register_order_lookup_pipeline(registry: &PipelineRegistry<AppError>) {
  let mut p = Pipeline::<OrderLookupCtxData, AppError>::new(&[("load_orders", false, None)]);

  p.on_root("load_orders", |ctx_data: ContextData<OrderLookupCtxData>| {
    Box::pin(async move {
      let (reconciler, catalog, user_id, query) = {
        let guard = ctx_data.read();
        (
          guard.app_state.reconciler.clone(),
          guard.app_state.catalog.clone(),
          guard.user_id.clone(),
          guard.query,
        )
      };

      match query {
        OrderQuery::All => {
          let orders = reconciler.orders_for_owner(&user_id).await?;
          info!(%user_id, count = orders.len(), "Order Lookup: listed orders.");
          ctx_data.write().orders = orders;
        }
        OrderQuery::Detail(order_id) => {
          let detail = reconciler.order_detail(order_id, &user_id, catalog.as_ref()).await?;
          ctx_data.write().detail = Some(detail);
        }
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
}
