// core/src/webhook/event.rs

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::{CheckoutError, CheckoutResult};

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// Discriminator of a verified event. Only `PaymentCompleted` reaches the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
  PaymentCompleted,
  Other(String),
}

impl EventKind {
  pub fn from_type(event_type: &str) -> Self {
    match event_type {
      CHECKOUT_SESSION_COMPLETED => EventKind::PaymentCompleted,
      other => EventKind::Other(other.to_string()),
    }
  }
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
  id: String,
  #[serde(rename = "type")]
  event_type: String,
  #[serde(default)]
  created: Option<i64>,
  data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
  object: serde_json::Value,
}

/// The checkout session carried by a `checkout.session.completed` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSessionObject {
  pub id: String,
  /// Charged amount in minor units, as reported by the provider.
  #[serde(default)]
  pub amount_total: Option<i64>,
  #[serde(default)]
  pub currency: Option<String>,
  #[serde(default)]
  pub metadata: Option<BTreeMap<String, String>>,
}

/// An event whose signature has been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedEvent {
  pub id: String,
  pub event_type: String,
  pub kind: EventKind,
  pub created: Option<DateTime<Utc>>,
  pub signed_at: DateTime<Utc>,
  object: serde_json::Value,
}

impl VerifiedEvent {
  /// Decodes verified bytes. Malformed JSON here is terminal: the signature was valid, so a
  /// redelivery would carry the same bytes.
  pub(crate) fn decode(raw_body: &[u8], signed_at: DateTime<Utc>) -> CheckoutResult<Self> {
    let envelope: EventEnvelope = serde_json::from_slice(raw_body)
      .map_err(|e| CheckoutError::MetadataMissing(format!("event payload is not a valid event: {}", e)))?;
    Ok(Self {
      kind: EventKind::from_type(&envelope.event_type),
      id: envelope.id,
      event_type: envelope.event_type,
      created: envelope.created.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
      signed_at,
      object: envelope.data.object,
    })
  }

  pub fn is_payment_completed(&self) -> bool {
    self.kind == EventKind::PaymentCompleted
  }

  /// The event's checkout session; only meaningful for `PaymentCompleted` events.
  pub fn checkout_session(&self) -> CheckoutResult<CheckoutSessionObject> {
    CheckoutSessionObject::deserialize(&self.object)
      .map_err(|e| CheckoutError::MetadataMissing(format!("checkout session object is malformed: {}", e)))
  }
}
