// core/src/model/session.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::identity::UserId;

/// Upper bound the provider enforces on a single metadata value.
pub const METADATA_VALUE_LIMIT: usize = 500;

pub const METADATA_USER_ID_KEY: &str = "userId";
pub const METADATA_ITEMS_KEY: &str = "items";

/// The compact line-item shape embedded in session metadata.
///
/// This is all that survives checkout: titles and images are dropped, and the reconciler treats it
/// as the only record of what was bought. `price` is the major-unit unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemProjection {
  pub id: String,
  pub quantity: i64,
  pub price: f64,
}

/// A checkout session registered with the provider. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
  pub session_id: String,
  pub user_id: UserId,
  pub encoded_line_items: String,
  pub created_at: DateTime<Utc>,
}

/// What the checkout endpoint hands back to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRedirect {
  pub redirect_url: String,
  pub session_id: String,
}
