// storefront/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{checkout_handlers, order_handlers, webhook_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(web::scope("/checkout").route("", web::post().to(checkout_handlers::start_checkout_handler)))
      .service(web::scope("/webhooks").route("/stripe", web::post().to(webhook_handlers::stripe_webhook_handler)))
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}/complete", web::post().to(order_handlers::complete_order_handler)),
      ),
  );
}
