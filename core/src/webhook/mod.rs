// core/src/webhook/mod.rs

//! Webhook Verifier: authenticates provider callbacks and decodes them into typed events.

pub mod event;
pub mod signature;

pub use event::{CheckoutSessionObject, EventKind, VerifiedEvent, CHECKOUT_SESSION_COMPLETED};
pub use signature::{
  compute_signature, signature_header, verify_signature, DEFAULT_TOLERANCE_SECS, SIGNATURE_HEADER,
};

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::error::CheckoutResult;

/// Verifies `raw_body` against `signature_header` with `secret`, then decodes the event.
///
/// Uses the default tolerance window and the current clock.
pub fn verify(raw_body: &[u8], signature_header: Option<&str>, secret: &str) -> CheckoutResult<VerifiedEvent> {
  WebhookVerifier::new(secret, DEFAULT_TOLERANCE_SECS).verify(raw_body, signature_header)
}

/// Holds the shared secret and the tolerance window for one provider endpoint.
#[derive(Clone)]
pub struct WebhookVerifier {
  secret: String,
  tolerance_secs: i64,
}

impl std::fmt::Debug for WebhookVerifier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WebhookVerifier")
      .field("secret", &"[REDACTED]")
      .field("tolerance_secs", &self.tolerance_secs)
      .finish()
  }
}

impl WebhookVerifier {
  pub fn new(secret: impl Into<String>, tolerance_secs: i64) -> Self {
    Self {
      secret: secret.into(),
      tolerance_secs,
    }
  }

  pub fn verify(&self, raw_body: &[u8], signature_header: Option<&str>) -> CheckoutResult<VerifiedEvent> {
    self.verify_at(raw_body, signature_header, Utc::now())
  }

  #[instrument(name = "webhook::verify", skip_all, fields(payload_len = raw_body.len()))]
  pub fn verify_at(
    &self,
    raw_body: &[u8],
    signature_header: Option<&str>,
    now: DateTime<Utc>,
  ) -> CheckoutResult<VerifiedEvent> {
    let signed_at = verify_signature(raw_body, signature_header, &self.secret, self.tolerance_secs, now)?;
    VerifiedEvent::decode(raw_body, signed_at)
  }
}
