// core/src/webhook/signature.rs

//! HMAC-SHA256 webhook signatures over the raw request body.
//!
//! Header format: `t=<unix seconds>,v1=<hex digest>[,v1=<hex digest>...]`. The signed message is
//! `"<t>." ++ body`, with `body` exactly as received. Parsing and re-serialising the JSON first
//! would change the bytes and break verification.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};

use crate::error::{CheckoutError, CheckoutResult};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Default accepted distance between the signed timestamp and the local clock, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, PartialEq, Eq)]
struct ParsedHeader<'a> {
  timestamp: i64,
  signatures: Vec<&'a str>,
}

fn reject(reason: impl Into<String>) -> CheckoutError {
  let reason = reason.into();
  warn!(security = true, %reason, "Webhook signature rejected.");
  CheckoutError::Authenticity(reason)
}

fn parse_header(header: &str) -> CheckoutResult<ParsedHeader<'_>> {
  let mut timestamp = None;
  let mut signatures = Vec::new();

  for part in header.split(',') {
    let Some((key, value)) = part.trim().split_once('=') else {
      continue;
    };
    match key {
      "t" => {
        timestamp = Some(
          value
            .parse::<i64>()
            .map_err(|_| reject("signature timestamp is not an integer"))?,
        )
      }
      "v1" => signatures.push(value),
      _ => {}
    }
  }

  let timestamp = timestamp.ok_or_else(|| reject("signature header has no timestamp"))?;
  if signatures.is_empty() {
    return Err(reject("signature header has no v1 signature"));
  }
  Ok(ParsedHeader { timestamp, signatures })
}

fn keyed_mac(secret: &str, timestamp: i64, payload: &[u8]) -> CheckoutResult<HmacSha256> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .map_err(|e| CheckoutError::Authenticity(format!("cannot key HMAC: {}", e)))?;
  mac.update(timestamp.to_string().as_bytes());
  mac.update(b".");
  mac.update(payload);
  Ok(mac)
}

/// Hex digest for `payload` signed at `timestamp`.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> CheckoutResult<String> {
  Ok(hex::encode(keyed_mac(secret, timestamp, payload)?.finalize().into_bytes()))
}

/// A complete signature header value, as the provider would send it.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> CheckoutResult<String> {
  Ok(format!("t={},v1={}", timestamp, compute_signature(secret, timestamp, payload)?))
}

/// Verifies `signature_header` for `raw_body` against `secret` as of `now`.
///
/// Returns the signed timestamp. Rejects an absent or malformed header, an empty secret, a
/// timestamp more than `tolerance_secs` away from `now` in either direction, and any digest
/// mismatch. Digests are compared in constant time.
pub fn verify_signature(
  raw_body: &[u8],
  signature_header: Option<&str>,
  secret: &str,
  tolerance_secs: i64,
  now: DateTime<Utc>,
) -> CheckoutResult<DateTime<Utc>> {
  if secret.is_empty() {
    return Err(reject("webhook secret is not configured"));
  }
  let header = signature_header
    .map(str::trim)
    .filter(|h| !h.is_empty())
    .ok_or_else(|| reject("signature header is missing"))?;
  let parsed = parse_header(header)?;

  // The timestamp is attacker-controlled until the digest is checked.
  let skew = now.timestamp().abs_diff(parsed.timestamp);
  if skew > u64::try_from(tolerance_secs).unwrap_or(0) {
    return Err(reject(format!(
      "signature timestamp outside tolerance ({}s > {}s)",
      skew, tolerance_secs
    )));
  }

  let mac = keyed_mac(secret, parsed.timestamp, raw_body)?;
  let matched = parsed.signatures.iter().any(|candidate| match hex::decode(candidate) {
    Ok(bytes) => mac.clone().verify_slice(&bytes).is_ok(),
    Err(_) => false,
  });
  if !matched {
    return Err(reject("no signature matches the payload"));
  }

  debug!(timestamp = parsed.timestamp, skew, "Webhook signature verified.");
  DateTime::<Utc>::from_timestamp(parsed.timestamp, 0).ok_or_else(|| reject("signature timestamp out of range"))
}
