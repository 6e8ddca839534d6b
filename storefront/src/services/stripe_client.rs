// storefront/src/services/stripe_client.rs

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument, warn};

use storefront_core::{PaymentProvider, ProviderSession, SessionRequest};

/// Stripe Checkout over its form-encoded REST API.
pub struct StripeClient {
  http: reqwest::Client,
  api_base: String,
  secret_key: String,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
  id: String,
  #[serde(default)]
  url: Option<String>,
  #[serde(default)]
  created: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  #[serde(default)]
  message: Option<String>,
  #[serde(rename = "type", default)]
  kind: Option<String>,
}

impl StripeClient {
  pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> anyhow::Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(15))
      .build()
      .context("building HTTP client for Stripe")?;
    Ok(Self {
      http,
      api_base: api_base.into().trim_end_matches('/').to_string(),
      secret_key: secret_key.into(),
    })
  }
}

/// Flattens a session request into Stripe's bracketed form fields.
pub fn session_form(request: &SessionRequest) -> Vec<(String, String)> {
  let mut form = vec![
    ("mode".to_string(), "payment".to_string()),
    ("payment_method_types[0]".to_string(), "card".to_string()),
    ("success_url".to_string(), request.success_url.clone()),
    ("cancel_url".to_string(), request.cancel_url.clone()),
  ];
  if let Some(email) = &request.customer_email {
    form.push(("customer_email".to_string(), email.clone()));
  }

  for (i, item) in request.line_items.iter().enumerate() {
    let prefix = format!("line_items[{}]", i);
    form.push((format!("{}[price_data][currency]", prefix), request.currency.clone()));
    form.push((format!("{}[price_data][product_data][name]", prefix), item.name.clone()));
    form.push((
      format!("{}[price_data][product_data][description]", prefix),
      item.description.clone(),
    ));
    for (j, image) in item.images.iter().enumerate() {
      form.push((format!("{}[price_data][product_data][images][{}]", prefix, j), image.clone()));
    }
    form.push((
      format!("{}[price_data][unit_amount]", prefix),
      item.unit_amount.cents().to_string(),
    ));
    form.push((format!("{}[quantity]", prefix), item.quantity.to_string()));
  }

  for (key, value) in &request.metadata {
    form.push((format!("metadata[{}]", key), value.clone()));
  }
  form
}

#[async_trait]
impl PaymentProvider for StripeClient {
  #[instrument(name = "stripe::create_checkout_session", skip_all, fields(line_items = request.line_items.len()))]
  async fn create_checkout_session(&self, request: &SessionRequest) -> anyhow::Result<ProviderSession> {
    let response = self
      .http
      .post(format!("{}/v1/checkout/sessions", self.api_base))
      .basic_auth(&self.secret_key, Option::<&str>::None)
      .form(&session_form(request))
      .send()
      .await
      .context("sending checkout session request to Stripe")?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      let detail = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .map(|e| {
          format!(
            "{}: {}",
            e.error.kind.unwrap_or_else(|| "stripe_error".to_string()),
            e.error.message.unwrap_or_default()
          )
        })
        .unwrap_or(body);
      warn!(status = status.as_u16(), %detail, "Stripe rejected checkout session.");
      return Err(anyhow!("Stripe returned {}: {}", status, detail));
    }

    let session: CheckoutSessionResponse = response
      .json()
      .await
      .context("decoding Stripe checkout session response")?;
    info!(session_id = %session.id, "Stripe checkout session created.");

    Ok(ProviderSession {
      id: session.id,
      url: session.url,
      created_at: session
        .created
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now),
    })
  }
}
