// core/src/error.rs
use thiserror::Error;

/// Failures of the pipeline runtime itself, as opposed to failures of the business steps.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Context type mismatch in registry dispatch (expected {expected_type})")]
  TypeMismatch { expected_type: String },

  #[error("No pipeline registered for context type {type_name}")]
  NotRegistered { type_name: String },

  #[error("Internal pipeline error: {0}")]
  Internal(String),
}

pub type PipelineOutcome<T, E = PipelineError> = std::result::Result<T, E>;

/// The checkout and order taxonomy shared by every component.
///
/// Only [`CheckoutError::StorageUnavailable`] is retryable: for webhook deliveries it is turned
/// into a 5xx so the provider redelivers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
  #[error("Validation failed: {0}")]
  Validation(String),

  #[error("Webhook authenticity check failed: {0}")]
  Authenticity(String),

  #[error("Payment event metadata missing or malformed: {0}")]
  MetadataMissing(String),

  /// Covers both a missing order and one owned by someone else.
  #[error("Order not found or unauthorized")]
  NotFound,

  #[error("Payment provider rejected the request: {0}")]
  Upstream(String),

  #[error("Order storage unavailable: {0}")]
  StorageUnavailable(String),
}

impl CheckoutError {
  pub fn is_retryable(&self) -> bool {
    matches!(self, CheckoutError::StorageUnavailable(_))
  }
}

pub type CheckoutResult<T> = std::result::Result<T, CheckoutError>;
