// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Where orders and products are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  /// Process-local maps; orders are lost on restart.
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "pg" => Ok(StoreBackend::Postgres),
      "memory" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!(
        "Invalid STORE_BACKEND '{}': expected 'postgres' or 'memory'",
        other
      ))),
    }
  }
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub run_migrations: bool,
  /// Absolute base URL used for provider redirect URLs and relative product images.
  pub app_base_url: String,

  pub stripe_secret_key: String,
  pub stripe_webhook_secret: String,
  pub stripe_api_base: String,
  pub checkout_currency: String,
  pub webhook_tolerance_secs: i64,
  pub store_timeout: Duration,
}

impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("store_backend", &self.store_backend)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("run_migrations", &self.run_migrations)
      .field("app_base_url", &self.app_base_url)
      .field("stripe_secret_key", &"[REDACTED]")
      .field("stripe_webhook_secret", &"[REDACTED]")
      .field("stripe_api_base", &self.stripe_api_base)
      .field("checkout_currency", &self.checkout_currency)
      .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
      .field("store_timeout", &self.store_timeout)
      .finish()
  }
}

fn parse_var<T>(name: &str, raw: String) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e)))
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from an arbitrary variable source.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |var_name: &str| {
      lookup(var_name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port: u16 = parse_var("SERVER_PORT", get_env("SERVER_PORT").unwrap_or_else(|_| "8080".to_string()))?;

    let store_backend: StoreBackend = get_env("STORE_BACKEND")
      .unwrap_or_else(|_| "postgres".to_string())
      .parse()?;
    let database_url = match store_backend {
      StoreBackend::Postgres => Some(get_env("DATABASE_URL")?),
      StoreBackend::Memory => get_env("DATABASE_URL").ok(),
    };
    let run_migrations: bool = parse_var(
      "RUN_MIGRATIONS",
      get_env("RUN_MIGRATIONS").unwrap_or_else(|_| "false".to_string()),
    )?;

    let app_base_url = get_env("APP_BASE_URL")
      .unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port))
      .trim_end_matches('/')
      .to_string();

    let stripe_secret_key = get_env("STRIPE_SECRET_KEY")?;
    let stripe_webhook_secret = get_env("STRIPE_WEBHOOK_SECRET")?;
    let stripe_api_base = get_env("STRIPE_API_BASE")
      .unwrap_or_else(|_| "https://api.stripe.com".to_string())
      .trim_end_matches('/')
      .to_string();
    let checkout_currency = get_env("CHECKOUT_CURRENCY")
      .unwrap_or_else(|_| "usd".to_string())
      .to_ascii_lowercase();

    let webhook_tolerance_secs: i64 = parse_var(
      "WEBHOOK_TOLERANCE_SECS",
      get_env("WEBHOOK_TOLERANCE_SECS").unwrap_or_else(|_| "300".to_string()),
    )?;
    if webhook_tolerance_secs <= 0 {
      return Err(AppError::Config("WEBHOOK_TOLERANCE_SECS must be positive".to_string()));
    }

    let store_timeout_ms: u64 = parse_var(
      "STORE_TIMEOUT_MS",
      get_env("STORE_TIMEOUT_MS").unwrap_or_else(|_| "5000".to_string()),
    )?;
    if store_timeout_ms == 0 {
      return Err(AppError::Config("STORE_TIMEOUT_MS must be positive".to_string()));
    }

    let config = Self {
      server_host,
      server_port,
      store_backend,
      database_url,
      run_migrations,
      app_base_url,
      stripe_secret_key,
      stripe_webhook_secret,
      stripe_api_base,
      checkout_currency,
      webhook_tolerance_secs,
      store_timeout: Duration::from_millis(store_timeout_ms),
    };
    tracing::info!(config = ?config, "Application configuration loaded successfully.");
    Ok(config)
  }
}
