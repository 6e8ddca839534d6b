// core/src/checkout.rs

//! Payment Session Builder: turns a client cart into a provider-hosted checkout session.
//!
//! Stateless apart from the provider call. The cart is reduced to a [`LineItemProjection`] list and
//! embedded as session metadata next to the user id; that projection is what the reconciler later
//! sees, never the original cart. Nothing here touches the order store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{CheckoutError, CheckoutResult};
use crate::model::cart::Cart;
use crate::model::identity::UserIdentity;
use crate::model::money::Money;
use crate::model::session::{
  CheckoutRedirect, LineItemProjection, PaymentSession, METADATA_ITEMS_KEY, METADATA_USER_ID_KEY,
  METADATA_VALUE_LIMIT,
};

/// One priced line of a hosted checkout page.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderLineItem {
  pub name: String,
  pub description: String,
  pub images: Vec<String>,
  pub unit_amount: Money,
  pub quantity: u32,
}

/// The request registered with the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRequest {
  pub currency: String,
  pub line_items: Vec<ProviderLineItem>,
  pub customer_email: Option<String>,
  pub success_url: String,
  pub cancel_url: String,
  pub metadata: BTreeMap<String, String>,
}

/// The provider's answer to a session request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSession {
  pub id: String,
  pub url: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Client for the payment provider's checkout-session API.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
  async fn create_checkout_session(&self, request: &SessionRequest) -> anyhow::Result<ProviderSession>;
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
  /// Absolute base URL of the storefront, without a trailing slash.
  pub public_base_url: String,
  pub currency: String,
}

/// A registered session plus the redirect the client should follow.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltSession {
  pub redirect: CheckoutRedirect,
  pub session: PaymentSession,
}

pub struct PaymentSessionBuilder {
  provider: Arc<dyn PaymentProvider>,
  settings: SessionSettings,
}

impl PaymentSessionBuilder {
  pub fn new(provider: Arc<dyn PaymentProvider>, settings: SessionSettings) -> Self {
    let public_base_url = settings.public_base_url.trim_end_matches('/').to_string();
    Self {
      provider,
      settings: SessionSettings {
        public_base_url,
        ..settings
      },
    }
  }

  /// Validates `cart` and turns it into a [`SessionRequest`] for `identity`.
  pub fn session_request(&self, identity: &UserIdentity, cart: &Cart) -> CheckoutResult<SessionRequest> {
    let lines = cart.validated_lines()?;

    let projection: Vec<LineItemProjection> = lines
      .iter()
      .map(|line| LineItemProjection {
        id: line.item.id.clone(),
        quantity: i64::from(line.quantity),
        price: line.item.price,
      })
      .collect();
    let encoded_items = encode_line_items(&projection)?;

    let line_items = lines
      .iter()
      .map(|line| ProviderLineItem {
        name: line.item.title.clone(),
        description: format!("Quantity: {}", line.quantity),
        images: line
          .item
          .image
          .as_deref()
          .and_then(|img| self.absolute_image_url(img))
          .into_iter()
          .collect(),
        unit_amount: line.unit_price,
        quantity: line.quantity,
      })
      .collect();

    let mut metadata = BTreeMap::new();
    metadata.insert(METADATA_USER_ID_KEY.to_string(), identity.id.to_string());
    metadata.insert(METADATA_ITEMS_KEY.to_string(), encoded_items);

    Ok(SessionRequest {
      currency: self.settings.currency.clone(),
      line_items,
      customer_email: identity.email.clone().filter(|e| !e.is_empty()),
      success_url: format!("{}/dashboard?success=true", self.settings.public_base_url),
      cancel_url: format!("{}/?canceled=true", self.settings.public_base_url),
      metadata,
    })
  }

  /// Registers a checkout session for `cart` with the provider.
  ///
  /// Provider failures are returned as [`CheckoutError::Upstream`] and are not retried.
  #[instrument(
    name = "session_builder::build_session",
    skip(self, identity, cart),
    fields(user_id = %identity.id, cart_lines = cart.items.len())
  )]
  pub async fn build_session(&self, identity: &UserIdentity, cart: Cart) -> CheckoutResult<BuiltSession> {
    let request = self.session_request(identity, &cart)?;
    let encoded_line_items = request
      .metadata
      .get(METADATA_ITEMS_KEY)
      .cloned()
      .unwrap_or_default();

    let provider_session = self
      .provider
      .create_checkout_session(&request)
      .await
      .map_err(|e| {
        warn!(error = %format!("{:#}", e), "Payment provider rejected checkout session.");
        CheckoutError::Upstream(format!("{:#}", e))
      })?;

    let redirect_url = provider_session
      .url
      .clone()
      .filter(|u| !u.is_empty())
      .ok_or_else(|| CheckoutError::Upstream("provider returned a session without a checkout url".to_string()))?;

    info!(session_id = %provider_session.id, "Checkout session created.");

    Ok(BuiltSession {
      redirect: CheckoutRedirect {
        redirect_url,
        session_id: provider_session.id.clone(),
      },
      session: PaymentSession {
        session_id: provider_session.id,
        user_id: identity.id.clone(),
        encoded_line_items,
        created_at: provider_session.created_at,
      },
    })
  }

  fn absolute_image_url(&self, image: &str) -> Option<String> {
    let image = image.trim();
    if image.is_empty() {
      None
    } else if image.starts_with("http://") || image.starts_with("https://") {
      Some(image.to_string())
    } else if image.starts_with('/') {
      Some(format!("{}{}", self.settings.public_base_url, image))
    } else {
      Some(format!("{}/{}", self.settings.public_base_url, image))
    }
  }
}

/// JSON-encodes the projection, enforcing the provider's metadata size limit.
pub fn encode_line_items(items: &[LineItemProjection]) -> CheckoutResult<String> {
  let encoded = serde_json::to_string(items)
    .map_err(|e| CheckoutError::Validation(format!("line items cannot be encoded: {}", e)))?;
  let len = encoded.chars().count();
  if len > METADATA_VALUE_LIMIT {
    return Err(CheckoutError::Validation(format!(
      "cart too large for checkout metadata ({} > {} characters)",
      len, METADATA_VALUE_LIMIT
    )));
  }
  Ok(encoded)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn projection(n: usize) -> Vec<LineItemProjection> {
    (0..n)
      .map(|i| LineItemProjection {
        id: format!("product-{:04}", i),
        quantity: 1,
        price: 9.99,
      })
      .collect()
  }

  #[test]
  fn encodes_compact_projection() {
    let encoded = encode_line_items(&[LineItemProjection {
      id: "p1".into(),
      quantity: 2,
      price: 10.0,
    }])
    .unwrap();
    assert_eq!(encoded, r#"[{"id":"p1","quantity":2,"price":10.0}]"#);
  }

  #[test]
  fn oversized_projection_is_a_validation_error() {
    let err = encode_line_items(&projection(20)).unwrap_err();
    assert!(matches!(err, CheckoutError::Validation(msg) if msg.contains("500")));
  }
}
