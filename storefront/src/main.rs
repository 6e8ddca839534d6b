// storefront/src/main.rs

use std::sync::Arc;

use actix_web::{web as actix_data, App, HttpServer};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use storefront::config::{AppConfig, StoreBackend};
use storefront::services::StripeClient;
use storefront::web::configure_app_routes;
use storefront::{build_state, db};
use storefront_core::{CatalogReader, InMemoryCatalog, InMemoryOrderStore, OrderStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting storefront checkout server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };
  tracing::debug!(config = ?app_config, "Configuration loaded.");

  let (store, catalog): (Arc<dyn OrderStore>, Arc<dyn CatalogReader>) = match app_config.store_backend {
    StoreBackend::Postgres => {
      let database_url = app_config.database_url.as_deref().unwrap_or_default();
      let pool = db::connect(database_url).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to connect to the database.");
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
      })?;
      if app_config.run_migrations {
        db::apply_schema(&pool).await.map_err(|e| {
          tracing::error!(error = %e, "Failed to apply database schema.");
          std::io::Error::other(e.to_string())
        })?;
      }
      (
        Arc::new(db::PgOrderStore::new(pool.clone())),
        Arc::new(db::PgCatalog::new(pool)),
      )
    }
    StoreBackend::Memory => {
      tracing::warn!("Using in-memory order store; orders do not survive a restart.");
      (Arc::new(InMemoryOrderStore::new()), Arc::new(InMemoryCatalog::default()))
    }
  };

  let provider = StripeClient::new(app_config.stripe_api_base.clone(), app_config.stripe_secret_key.clone())
    .map_err(|e| std::io::Error::other(format!("{:#}", e)))?;

  let app_state = build_state(app_config.clone(), store, catalog, Arc::new(provider));
  tracing::info!("Pipelines registered.");

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
