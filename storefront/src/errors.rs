// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use storefront_core::{CheckoutError, PipelineError};

/// Where an unauthenticated checkout attempt is sent to sign in.
pub const CHECKOUT_SIGNIN_REDIRECT: &str = "/auth/signin?callbackUrl=%2Fcheckout";

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication required")]
  Unauthenticated { redirect_url: Option<String> },

  #[error("Webhook Authenticity Error: {0}")]
  Authenticity(String),

  #[error("Payment Event Metadata Error: {0}")]
  Metadata(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Payment Provider Error: {0}")]
  Upstream(String),

  #[error("Storage Unavailable: {0}")]
  StorageUnavailable(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Pipeline Error: {source}")]
  Workflow {
    #[from]
    source: PipelineError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<CheckoutError> for AppError {
  fn from(err: CheckoutError) -> Self {
    match err {
      CheckoutError::Validation(m) => AppError::Validation(m),
      CheckoutError::Authenticity(m) => AppError::Authenticity(m),
      CheckoutError::MetadataMissing(m) => AppError::Metadata(m),
      CheckoutError::NotFound => AppError::NotFound("Order not found or unauthorized".to_string()),
      CheckoutError::Upstream(m) => AppError::Upstream(m),
      CheckoutError::StorageUnavailable(m) => AppError::StorageUnavailable(m),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::Authenticity(_) | AppError::Metadata(_) => StatusCode::BAD_REQUEST,
      AppError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
      AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      AppError::Config(_) | AppError::Database(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, status = status.as_u16(), "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Responding with error");
    }

    let body = match self {
      AppError::Validation(m) => json!({"error": m}),
      AppError::Unauthenticated { redirect_url: Some(url) } => json!({"error": "Unauthorized", "redirectUrl": url}),
      AppError::Unauthenticated { redirect_url: None } => json!({"error": "Unauthorized"}),
      // Rejection details stay in the logs.
      AppError::Authenticity(_) => json!({"error": "Webhook signature verification failed"}),
      AppError::Metadata(m) => json!({"error": "Invalid payment event", "detail": m}),
      AppError::NotFound(m) => json!({"error": m}),
      // Only checkout talks to the provider; the client is sent back through sign-in.
      AppError::Upstream(_) => json!({"error": "Error creating checkout session", "redirectUrl": CHECKOUT_SIGNIN_REDIRECT}),
      AppError::StorageUnavailable(_) => json!({"error": "Order storage temporarily unavailable"}),
      AppError::Config(_) => json!({"error": "Configuration issue"}),
      AppError::Database(_) => json!({"error": "Database operation failed"}),
      AppError::Workflow { source } => {
        tracing::error!(pipeline_error = ?source, "Workflow error details");
        json!({"error": "Workflow processing error"})
      }
      AppError::Internal(_) => json!({"error": "An internal error occurred"}),
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
