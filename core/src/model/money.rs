// core/src/model/money.rs

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An amount in minor currency units (cents).
///
/// JSON surfaces carry major units (`20.0` for 2000 cents), which is what the storefront client
/// sends and what dashboards read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
  pub const ZERO: Money = Money(0);

  pub const fn from_cents(cents: i64) -> Self {
    Money(cents)
  }

  /// Converts a major-unit price, rounding half away from zero. Returns `None` for non-finite
  /// values or values outside the `i64` cents range.
  pub fn from_major(amount: f64) -> Option<Self> {
    if !amount.is_finite() {
      return None;
    }
    let cents = (amount * 100.0).round();
    if cents < i64::MIN as f64 || cents > i64::MAX as f64 {
      return None;
    }
    Some(Money(cents as i64))
  }

  pub const fn cents(self) -> i64 {
    self.0
  }

  pub fn as_major(self) -> f64 {
    self.0 as f64 / 100.0
  }

  pub fn checked_mul(self, quantity: u32) -> Option<Money> {
    self.0.checked_mul(i64::from(quantity)).map(Money)
  }
}

impl fmt::Display for Money {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let sign = if self.0 < 0 { "-" } else { "" };
    let abs = self.0.unsigned_abs();
    write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
  }
}

impl Serialize for Money {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(self.as_major())
  }
}

impl<'de> Deserialize<'de> for Money {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let major = f64::deserialize(deserializer)?;
    Money::from_major(major).ok_or_else(|| serde::de::Error::custom("amount out of range"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rounds_major_units_to_cents() {
    assert_eq!(Money::from_major(10.0), Some(Money::from_cents(1000)));
    assert_eq!(Money::from_major(19.99), Some(Money::from_cents(1999)));
    assert_eq!(Money::from_major(0.005), Some(Money::from_cents(1)));
    assert_eq!(Money::from_major(f64::NAN), None);
    assert_eq!(Money::from_major(f64::INFINITY), None);
  }

  #[test]
  fn displays_two_decimals() {
    assert_eq!(Money::from_cents(2000).to_string(), "20.00");
    assert_eq!(Money::from_cents(5).to_string(), "0.05");
    assert_eq!(Money::from_cents(-150).to_string(), "-1.50");
  }

  #[test]
  fn json_uses_major_units() {
    assert_eq!(serde_json::to_string(&Money::from_cents(2000)).unwrap(), "20.0");
    let parsed: Money = serde_json::from_str("12.5").unwrap();
    assert_eq!(parsed, Money::from_cents(1250));
  }
}
